//! waffle's main application entry point.
//! Loads the project in the current directory, builds the command tree and
//! runs it against the process arguments.

use std::path::Path;
use std::process::ExitCode;

use waffle::{
    app::{command_tree, App},
    logger::init_logger,
    prompt::DialoguerPrompter,
};

fn program_name(arg0: Option<String>) -> String {
    arg0.as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "waffle".to_string())
}

fn main() -> ExitCode {
    init_logger();

    let mut args = std::env::args();
    let program = program_name(args.next());
    let args: Vec<String> = args.collect();

    let mut app = match App::load(".", Box::new(DialoguerPrompter::new())) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("Failed to load project: {}", err);
            return ExitCode::FAILURE;
        }
    };

    // The tree has already printed usage or the failure by the time run returns.
    let tree = command_tree(&program, &app);
    match tree.run(&mut app, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
