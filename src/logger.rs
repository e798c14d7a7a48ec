use env_logger::Env;

/// Environment variable holding the log filter, e.g. `WAFFLE_LOG=debug`.
pub const LOG_ENV: &str = "WAFFLE_LOG";

pub fn init_logger() {
    env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, "info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
