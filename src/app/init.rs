use log::info;
use url::Url;

use crate::command::{CommandId, CommandTree, Flag, Invocation};
use crate::config::Version;
use crate::error::{Error, Result};
use crate::template::builtin;
use crate::vcs::GitRepo;

use super::{no_args, report, App};

pub(super) fn register(tree: &mut CommandTree<App>, parent: CommandId, app: &App) {
    let config = &app.project.config;
    let cmd = tree.add_command(
        parent,
        "init",
        "initialize current directory with new project tree",
        init,
    );
    let maintainer = &config.maintainer;
    let flags = [
        Flag::value("name", config.name.clone(), "Project name"),
        Flag::value("desc", config.description.clone(), "Project description"),
        Flag::value("version", config.version.to_string(), "Current version"),
        Flag::value("maintainer", maintainer.name.clone(), "Maintainer name"),
        Flag::value("email", maintainer.email.clone(), "Maintainer email"),
        Flag::value("url", config.url.clone(), "Project webpage URL"),
        Flag::value("mod", config.module.clone(), "Module path"),
        Flag::value("origin", "", "Git remote URL"),
    ];
    for flag in flags {
        tree.flag(cmd, flag);
    }
}

/// Copies the flag values into the project configuration.
fn apply_flags(app: &mut App, inv: &Invocation<'_, App>) -> Result<()> {
    let flag = |name: &str| inv.flag(name).unwrap_or_default().to_string();

    let url = flag("url");
    if !url.is_empty() {
        Url::parse(&url).map_err(|e| Error::Usage(format!("invalid --url {url:?}: {e}")))?;
    }
    let version: Version = flag("version")
        .parse()
        .map_err(|e: Error| Error::Usage(e.to_string()))?;

    let config = &mut app.project.config;
    config.name = flag("name");
    config.description = flag("desc");
    config.version = version;
    config.maintainer.name = flag("maintainer");
    config.maintainer.email = flag("email");
    config.url = url;
    config.module = flag("mod");
    Ok(())
}

fn init(app: &mut App, inv: &Invocation<'_, App>) -> Result<()> {
    no_args(inv.args())?;
    apply_flags(app, inv)?;

    let mut origin = inv.flag("origin").unwrap_or_default().to_string();
    if app.repo.is_none() {
        let repo = GitRepo::init(app.project.root())?;
        if app.project.config.module.is_empty() {
            app.project.config.module = app.prompter.word("Module Path")?;
        }
        if origin.is_empty() {
            origin = app.prompter.word("Git Remote URL")?;
        }
        app.repo = Some(repo);
    }

    if let Some(repo) = &app.repo {
        if !origin.is_empty() {
            info!("Setting git remote origin to {}", origin);
            repo.set_origin(&origin)?;
        }
    }

    app.project.save()?;
    let dest = app.project.root().to_path_buf();
    app.render_bundle(builtin::GENERATE, &dest)?;
    report(&mut inv.output(), "Initialized project", &dest)
}
