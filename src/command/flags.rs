//! Per-node flag declarations and their parsing.
//!
//! Each node's flags are turned into a throwaway `clap::Command` at parse time.
//! Parsing stops at the first positional argument: it and everything after it
//! is handed back as the residual argument list for the node.

use std::collections::{HashMap, HashSet};

use clap::{Arg, ArgAction};

use crate::error::{Error, Result};

const RESIDUAL: &str = "__residual";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// `--name <value>` or `--name=value`
    Value,
    /// `--name`, false unless present
    Switch,
}

/// A single flag declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: String,
    pub default: String,
    pub description: String,
    pub kind: FlagKind,
}

impl Flag {
    pub fn value(
        name: impl Into<String>,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            description: description.into(),
            kind: FlagKind::Value,
        }
    }

    pub fn switch(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: String::new(),
            description: description.into(),
            kind: FlagKind::Switch,
        }
    }

    /// Left column of the `Flags:` block.
    pub(crate) fn label(&self) -> String {
        match self.kind {
            FlagKind::Value => format!("--{} value", self.name),
            FlagKind::Switch => format!("--{}", self.name),
        }
    }

    fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.description.clone());
        match self.kind {
            FlagKind::Value => arg
                .num_args(1)
                .allow_hyphen_values(true)
                .action(ArgAction::Set)
                .default_value(self.default.clone()),
            FlagKind::Switch => arg.action(ArgAction::SetTrue),
        }
    }
}

/// The flags declared on one node.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
}

impl FlagSet {
    /// Declares a flag, replacing an earlier declaration with the same name.
    pub fn add(&mut self, flag: Flag) {
        match self.flags.iter_mut().find(|f| f.name == flag.name) {
            Some(existing) => *existing = flag,
            None => self.flags.push(flag),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name == name)
    }

    /// Parses `args` against this set, returning the flag values and the
    /// non-flag remainder.
    pub fn parse(&self, command: &str, args: &[String]) -> Result<(FlagValues, Vec<String>)> {
        let mut cmd = clap::Command::new(command.to_string())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true);
        for flag in &self.flags {
            cmd = cmd.arg(flag.to_arg());
        }
        cmd = cmd.arg(
            Arg::new(RESIDUAL)
                .num_args(1..)
                .action(ArgAction::Append)
                .trailing_var_arg(true),
        );

        let matches = cmd.try_get_matches_from(args).map_err(usage_error)?;

        let mut values = FlagValues::default();
        for flag in &self.flags {
            match flag.kind {
                FlagKind::Value => {
                    if let Some(value) = matches.get_one::<String>(&flag.name) {
                        values.values.insert(flag.name.clone(), value.clone());
                    }
                }
                FlagKind::Switch => {
                    if matches.get_flag(&flag.name) {
                        values.switches.insert(flag.name.clone());
                    }
                }
            }
        }

        let residual = matches
            .get_many::<String>(RESIDUAL)
            .map(|rest| rest.cloned().collect())
            .unwrap_or_default();

        Ok((values, residual))
    }
}

fn usage_error(err: clap::Error) -> Error {
    let rendered = err.to_string();
    let message = rendered.lines().next().unwrap_or_default();
    Error::Usage(message.trim_start_matches("error: ").to_string())
}

/// Parsed flag values of one node.
#[derive(Debug, Clone, Default)]
pub struct FlagValues {
    values: HashMap<String, String>,
    switches: HashSet<String>,
}

impl FlagValues {
    /// Value of a `Value` flag, falling back to its declared default.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether a `Switch` flag was given.
    pub fn is_set(&self, name: &str) -> bool {
        self.switches.contains(name)
    }
}
