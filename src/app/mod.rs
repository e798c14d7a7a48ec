//! The waffle command line: application state and the command tree built
//! around it.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::api::Project;
use crate::command::CommandTree;
use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::template::{builtin, Formatters, TemplateSet};
use crate::vcs::{load_git_maintainer, GitRepo};

mod generate;
mod help;
mod init;
mod server;

/// State shared by every command handler.
pub struct App {
    pub project: Project,
    pub repo: Option<GitRepo>,
    pub prompter: Box<dyn Prompter>,
    pub formatters: Formatters,
}

impl App {
    pub fn new(project: Project, prompter: Box<dyn Prompter>, formatters: Formatters) -> Self {
        Self {
            project,
            repo: None,
            prompter,
            formatters,
        }
    }

    /// Loads the project in `dir` and fills in what git knows about it: the
    /// version from the highest tag and the maintainer from the global git
    /// configuration, each only when the project does not set it.
    pub fn load<P: AsRef<Path>>(dir: P, prompter: Box<dyn Prompter>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut app = App::new(Project::load(dir)?, prompter, Formatters::default());

        app.repo = match GitRepo::open(dir) {
            Ok(repo) => Some(repo),
            Err(Error::NoGitRepo) => None,
            Err(e) => return Err(e),
        };

        if let Some(repo) = &app.repo {
            if app.project.config.version.is_zero() {
                match repo.current_version() {
                    Ok(version) => app.project.config.version = version,
                    Err(Error::NoGitVersion) => debug!("No version tags found"),
                    Err(e) => return Err(e),
                }
            }
        }

        let maintainer = &mut app.project.config.maintainer;
        if maintainer.name.is_empty() || maintainer.email.is_empty() {
            match load_git_maintainer() {
                Ok(git) => {
                    if maintainer.name.is_empty() {
                        maintainer.name = git.name;
                    }
                    if maintainer.email.is_empty() {
                        maintainer.email = git.email;
                    }
                }
                Err(e) => warn!("Could not read git maintainer: {}", e),
            }
        }

        Ok(app)
    }

    /// Renders a built-in template bundle into `dest` using the project
    /// configuration.
    pub fn render_bundle(&self, bundle: &str, dest: &Path) -> Result<()> {
        let root = builtin::bundle(bundle).ok_or_else(|| Error::TemplateRootError {
            path: bundle.to_string(),
            reason: "no such template bundle".to_string(),
        })?;
        let templates = TemplateSet::discover(&root)?;
        templates.execute(dest, &self.project.config, &self.formatters)
    }
}

/// Builds the full waffle command tree. Flag defaults are taken from the
/// loaded application state.
pub fn command_tree(program: &str, app: &App) -> CommandTree<App> {
    let mut tree = CommandTree::new(program);
    let root = tree.root();
    init::register(&mut tree, root, app);
    generate::register(&mut tree, root, app);
    help::register(&mut tree, root);
    server::register(&mut tree, root, app);
    tree
}

/// Rejects positional arguments for commands that take none.
fn no_args(args: &[String]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(Error::Usage(format!("unexpected arguments {args:?}")))
    }
}

fn output_dir(value: Option<&str>) -> PathBuf {
    PathBuf::from(value.unwrap_or("."))
}

fn report(out: &mut impl Write, what: &str, dest: &Path) -> Result<()> {
    writeln!(out, "{} in {}", what, dest.display())?;
    Ok(())
}
