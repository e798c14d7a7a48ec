use std::io::Write;

use crate::command::{CommandId, CommandTree, Invocation};
use crate::error::{Error, Result};

use super::App;

pub(super) fn register(tree: &mut CommandTree<App>, parent: CommandId) {
    let cmd = tree.add_command(
        parent,
        "help",
        "obtain more information about a command",
        help,
    );
    tree.set_usage(cmd, "<command> [<subcommand> ...]");
}

fn help(_: &mut App, inv: &Invocation<'_, App>) -> Result<()> {
    let args = inv.args();
    if args.is_empty() {
        return Err(Error::Usage("expecting a command name".to_string()));
    }

    let tree = inv.tree();
    let target = tree
        .lookup_path(tree.root(), args)
        .ok_or_else(|| Error::Usage(format!("Command {:?} not found", args.join(" "))))?;
    write!(inv.output(), "{}", tree.usage(target))?;
    Ok(())
}
