//! Template bundles compiled into the binary.

use super::root::MemoryRoot;

/// Name of the bundle that lays out a new project.
pub const GENERATE: &str = "generate";

/// Name of the bundle that renders the server routing code.
pub const SERVER: &str = "server";

/// Pairs a bundle file's path with its contents from `templates/<bundle>/`.
macro_rules! bundle_file {
    ($bundle:literal, $path:literal) => {
        (
            $path,
            include_str!(concat!("../../templates/", $bundle, "/", $path)),
        )
    };
}

const GENERATE_FILES: &[(&str, &str)] = &[
    bundle_file!("generate", "!gitignore.tmpl"),
    bundle_file!("generate", "$license.tmpl"),
    bundle_file!("generate", "Cargo.toml.tmpl"),
    bundle_file!("generate", "README.md.tmpl"),
    bundle_file!("generate", "src/main.rs.tmpl"),
];

const SERVER_FILES: &[(&str, &str)] = &[bundle_file!("server", "src/server/mod.rs.tmpl")];

/// Returns the bundle called `name` as a template root.
pub fn bundle(name: &str) -> Option<MemoryRoot> {
    let files = match name {
        GENERATE => GENERATE_FILES,
        SERVER => SERVER_FILES,
        _ => return None,
    };
    Some(files.iter().map(|(path, contents)| (*path, *contents)).collect())
}
