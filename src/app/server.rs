use crate::command::{CommandId, CommandTree, Flag, Invocation};
use crate::error::{Error, Result};
use crate::template::builtin;

use super::{no_args, output_dir, report, App};

pub(super) fn register(tree: &mut CommandTree<App>, parent: CommandId, app: &App) {
    let server = tree.add_group(parent, "server", "manage api server controllers");

    let add = tree.add_group(server, "add", "add controllers to the server");
    let cmd = tree.add_command(
        add,
        "controller",
        "add a controller to the server",
        add_controller,
    );
    tree.set_usage(cmd, "<name> <path>");

    let remove = tree.add_group(server, "remove", "remove controllers from the server");
    let cmd = tree.add_command(
        remove,
        "controller",
        "remove a controller from the server",
        rm_controller,
    );
    tree.set_usage(cmd, "<name>");

    let cmd = tree.add_command(
        server,
        "generate",
        "generate the server routing code",
        generate,
    );
    let default = app.project.root().display().to_string();
    tree.flag(cmd, Flag::value("output", default, "Output directory"));
}

fn add_controller(app: &mut App, inv: &Invocation<'_, App>) -> Result<()> {
    let [name, path] = inv.args() else {
        return Err(Error::Usage("expecting <name> <path>".to_string()));
    };
    if !path.starts_with('/') {
        return Err(Error::Usage(format!("controller path {path:?} must start with '/'")));
    }

    app.project.config.add_controller(name, path);
    save_and_regenerate(app, inv)
}

fn rm_controller(app: &mut App, inv: &Invocation<'_, App>) -> Result<()> {
    let [name] = inv.args() else {
        return Err(Error::Usage("expecting <name>".to_string()));
    };
    if !app.project.config.remove_controller(name) {
        return Err(Error::ConfigError(format!("no controller named {name:?}")));
    }
    save_and_regenerate(app, inv)
}

fn save_and_regenerate(app: &mut App, inv: &Invocation<'_, App>) -> Result<()> {
    app.project.save()?;
    let dest = app.project.root().to_path_buf();
    app.render_bundle(builtin::SERVER, &dest)?;
    report(&mut inv.output(), "Updated server", &dest)
}

fn generate(app: &mut App, inv: &Invocation<'_, App>) -> Result<()> {
    no_args(inv.args())?;
    let dest = output_dir(inv.flag("output"));
    app.render_bundle(builtin::SERVER, &dest)?;
    report(&mut inv.output(), "Generated server", &dest)
}
