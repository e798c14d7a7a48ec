use crate::command::{CommandId, CommandTree, Flag, Invocation};
use crate::error::Result;
use crate::template::builtin;

use super::{no_args, output_dir, report, App};

pub(super) fn register(tree: &mut CommandTree<App>, parent: CommandId, app: &App) {
    let cmd = tree.add_command(
        parent,
        "generate",
        "(re)generate all code for the project",
        generate,
    );
    let default = app.project.root().display().to_string();
    tree.flag(cmd, Flag::value("output", default, "Output directory"));
}

fn generate(app: &mut App, inv: &Invocation<'_, App>) -> Result<()> {
    no_args(inv.args())?;
    let dest = output_dir(inv.flag("output"));
    app.render_bundle(builtin::GENERATE, &dest)?;
    report(&mut inv.output(), "Generated project", &dest)
}
