//! Git integration: repository discovery, version tags, maintainer identity
//! and the `origin` remote.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use git2::{ErrorCode, Repository};
use log::debug;

use crate::config::{Maintainer, Version};
use crate::error::{Error, Result};

/// Reads the maintainer identity from the user's global git configuration.
/// Unset fields are left empty.
pub fn load_git_maintainer() -> Result<Maintainer> {
    let config = git2::Config::open_default()?;
    Ok(Maintainer {
        name: config.get_string("user.name").unwrap_or_default(),
        email: config.get_string("user.email").unwrap_or_default(),
    })
}

/// Highest version in `versions`, compared numerically.
pub fn highest_version<I: IntoIterator<Item = Version>>(versions: I) -> Option<Version> {
    versions.into_iter().max()
}

pub struct GitRepo {
    repo: Repository,
}

impl fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitRepo")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl GitRepo {
    /// Opens the repository at `dir`, failing with [`Error::NoGitRepo`] when
    /// there is none.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        match Repository::open(dir.as_ref()) {
            Ok(repo) => Ok(Self { repo }),
            Err(e) if e.code() == ErrorCode::NotFound => Err(Error::NoGitRepo),
            Err(e) => Err(Error::Git2Error(e)),
        }
    }

    pub fn init<P: AsRef<Path>>(dir: P) -> Result<Self> {
        debug!("Initializing git repository in {}", dir.as_ref().display());
        Ok(Self {
            repo: Repository::init(dir.as_ref())?,
        })
    }

    /// Remote names mapped to their URLs.
    pub fn remotes(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut remotes = BTreeMap::new();
        for name in self.repo.remotes()?.iter().flatten() {
            let remote = self.repo.find_remote(name)?;
            let urls = remotes.entry(name.to_string()).or_insert_with(Vec::new);
            if let Some(url) = remote.url() {
                urls.push(url.to_string());
            }
        }
        Ok(remotes)
    }

    /// Creates the `origin` remote, failing with [`Error::OriginExists`] when
    /// it is already configured.
    pub fn set_origin(&self, url: &str) -> Result<()> {
        if self.remotes()?.contains_key("origin") {
            return Err(Error::OriginExists);
        }
        self.repo.remote("origin", url)?;
        Ok(())
    }

    /// Versions of all tags that parse as semantic versions.
    pub fn versions(&self) -> Result<Vec<Version>> {
        let tags = self.repo.tag_names(None)?;
        Ok(tags
            .iter()
            .flatten()
            .filter_map(|tag| match tag.parse::<Version>() {
                Ok(version) => Some(version),
                Err(_) => {
                    debug!("Ignoring tag {:?}", tag);
                    None
                }
            })
            .collect())
    }

    /// The highest tagged version, or [`Error::NoGitVersion`].
    pub fn current_version(&self) -> Result<Version> {
        highest_version(self.versions()?).ok_or(Error::NoGitVersion)
    }
}
