//! Hierarchical command dispatch.
//!
//! A [`CommandTree`] is an arena of named command nodes. Every node owns its
//! own flag set and optional handler; nodes without a handler route to one of
//! their children. [`CommandTree::run`] resolves an argument vector to a leaf,
//! parsing each selected node's flags along the way, and is the only place
//! that reports errors to the user.

use std::collections::BTreeMap;
use std::io::Write;

use log::{debug, warn};

use crate::error::{Error, Result};

mod flags;
mod output;
mod usage;

pub use flags::{Flag, FlagKind, FlagSet, FlagValues};
pub use output::{Output, SharedBuffer};

/// Handle of a node inside a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

/// Handler invoked when its node is the last command named on the command
/// line. `C` is the caller supplied context shared by all handlers.
pub type Handler<C> = Box<dyn Fn(&mut C, &Invocation<'_, C>) -> Result<()>>;

struct CommandNode<C> {
    name: String,
    description: String,
    usage: Option<String>,
    handler: Option<Handler<C>>,
    flags: FlagSet,
    parent: Option<CommandId>,
    children: BTreeMap<String, CommandId>,
}

/// Everything a handler gets to see about its invocation.
pub struct Invocation<'a, C> {
    tree: &'a CommandTree<C>,
    node: CommandId,
    flags: FlagValues,
    args: Vec<String>,
}

impl<'a, C> Invocation<'a, C> {
    /// Positional arguments left after the node's flags.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Value of a value flag declared on this node.
    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags.get(name)
    }

    /// Whether a switch declared on this node was given.
    pub fn is_set(&self, name: &str) -> bool {
        self.flags.is_set(name)
    }

    pub fn node(&self) -> CommandId {
        self.node
    }

    pub fn tree(&self) -> &'a CommandTree<C> {
        self.tree
    }

    pub fn output(&self) -> Output {
        self.tree.output()
    }
}

pub struct CommandTree<C> {
    nodes: Vec<CommandNode<C>>,
    output: Output,
}

impl<C> CommandTree<C> {
    /// Creates a tree whose root is named `name`, usually the program name.
    pub fn new(name: impl Into<String>) -> Self {
        let root = CommandNode {
            name: name.into(),
            description: String::new(),
            usage: None,
            handler: None,
            flags: FlagSet::default(),
            parent: None,
            children: BTreeMap::new(),
        };
        Self {
            nodes: vec![root],
            output: Output::default(),
        }
    }

    pub fn root(&self) -> CommandId {
        CommandId(0)
    }

    /// Registers a leaf command under `parent` and returns its handle.
    pub fn add_command<F>(
        &mut self,
        parent: CommandId,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> CommandId
    where
        F: Fn(&mut C, &Invocation<'_, C>) -> Result<()> + 'static,
    {
        self.insert(
            parent,
            name.into(),
            description.into(),
            Some(Box::new(handler)),
        )
    }

    /// Registers a command that only routes to its own children.
    pub fn add_group(
        &mut self,
        parent: CommandId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> CommandId {
        self.insert(parent, name.into(), description.into(), None)
    }

    fn insert(
        &mut self,
        parent: CommandId,
        name: String,
        description: String,
        handler: Option<Handler<C>>,
    ) -> CommandId {
        let id = CommandId(self.nodes.len());
        self.nodes.push(CommandNode {
            name: name.clone(),
            description,
            usage: None,
            handler,
            flags: FlagSet::default(),
            parent: Some(parent),
            children: BTreeMap::new(),
        });

        let replaced = self.nodes[parent.0].children.insert(name.clone(), id);
        if replaced.is_some() {
            warn!(
                "Command '{}' registered twice under '{}', keeping the last one",
                name,
                self.path(parent).join(" ")
            );
        }
        id
    }

    /// Declares a flag on a node.
    pub fn flag(&mut self, id: CommandId, flag: Flag) -> &mut Self {
        self.nodes[id.0].flags.add(flag);
        self
    }

    /// Sets the argument hint shown in a leaf's usage line.
    pub fn set_usage(&mut self, id: CommandId, hint: impl Into<String>) -> &mut Self {
        self.nodes[id.0].usage = Some(hint.into());
        self
    }

    fn node(&self, id: CommandId) -> &CommandNode<C> {
        &self.nodes[id.0]
    }

    pub fn name(&self, id: CommandId) -> &str {
        &self.node(id).name
    }

    pub fn description(&self, id: CommandId) -> &str {
        &self.node(id).description
    }

    pub fn parent(&self, id: CommandId) -> Option<CommandId> {
        self.node(id).parent
    }

    pub fn flags(&self, id: CommandId) -> &FlagSet {
        &self.node(id).flags
    }

    /// Names of the children of a node, sorted.
    pub fn children(&self, id: CommandId) -> impl Iterator<Item = &str> {
        self.node(id).children.keys().map(String::as_str)
    }

    pub fn lookup(&self, id: CommandId, name: &str) -> Option<CommandId> {
        self.node(id).children.get(name).copied()
    }

    /// Follows `names` down from `id`, one child per name.
    pub fn lookup_path<S: AsRef<str>>(&self, id: CommandId, names: &[S]) -> Option<CommandId> {
        names
            .iter()
            .try_fold(id, |current, name| self.lookup(current, name.as_ref()))
    }

    /// Names from the root down to `id`.
    pub fn path(&self, id: CommandId) -> Vec<&str> {
        let mut path = vec![self.name(id)];
        let mut current = self.parent(id);
        while let Some(parent) = current {
            path.push(self.name(parent));
            current = self.parent(parent);
        }
        path.reverse();
        path
    }

    /// Handle to the sink every node writes usage and error text to.
    pub fn output(&self) -> Output {
        self.output.clone()
    }

    /// Redirects the output of every node in the tree.
    pub fn set_output(&mut self, output: Output) {
        self.output = output;
    }

    /// Runs the tree against `args` (without the program name).
    ///
    /// On failure the tagged node's usage text, or a `Command <name> failed`
    /// line, is written to the tree output before the error is returned.
    pub fn run<S: AsRef<str>>(&self, ctx: &mut C, args: &[S]) -> Result<()> {
        let args = args.iter().map(|a| a.as_ref().to_string()).collect();
        let root = self.root();
        let result = self
            .dispatch(ctx, root, args)
            .map_err(|err| self.tag(root, err));
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    fn dispatch(&self, ctx: &mut C, id: CommandId, args: Vec<String>) -> Result<()> {
        let mut args = args.into_iter();
        let Some(name) = args.next() else {
            return Err(self.tag(id, Error::Usage("expecting sub-command".to_string())));
        };
        let Some(child) = self.lookup(id, &name) else {
            return Err(self.tag(id, Error::Usage(format!("Unknown command {name:?}"))));
        };

        let rest: Vec<String> = args.collect();
        let node = self.node(child);
        let parsed = node.flags.parse(&node.name, &rest);
        let (flags, rest) = parsed.map_err(|e| self.tag(child, e))?;
        debug!(
            "Dispatching '{}' with {:?}",
            self.path(child).join(" "),
            rest
        );

        let result = match &node.handler {
            Some(handler) => {
                let invocation = Invocation {
                    tree: self,
                    node: child,
                    flags,
                    args: rest,
                };
                handler(ctx, &invocation)
            }
            None => self.dispatch(ctx, child, rest),
        };
        result.map_err(|e| self.tag(child, e))
    }

    /// Tags `err` with `id` unless it already carries its origin.
    fn tag(&self, id: CommandId, err: Error) -> Error {
        match err {
            err @ Error::Command { .. } => err,
            err => Error::Command {
                command: self.name(id).to_string(),
                node: id,
                source: Box::new(err),
            },
        }
    }

    fn report(&self, err: &Error) {
        let mut out = self.output();
        let written = if err.is_usage() {
            let node = err.node().unwrap_or(self.root());
            writeln!(out, "{}", err.cause()).and_then(|_| write!(out, "{}", self.usage(node)))
        } else {
            writeln!(out, "{err}")
        };
        if let Err(e) = written {
            warn!("Failed to write command output: {}", e);
        }
    }
}
