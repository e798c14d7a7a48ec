use std::fmt::Write;

use super::{CommandId, CommandTree};

impl<C> CommandTree<C> {
    /// Renders the usage line and help text of a node.
    ///
    /// The result depends only on the node's path, its flags and its
    /// children.
    pub fn usage(&self, id: CommandId) -> String {
        let mut out = String::new();
        self.write_usage_line(&mut out, id);
        self.write_flags(&mut out, id);
        self.write_commands(&mut out, id);
        out
    }

    fn write_usage_line(&self, out: &mut String, id: CommandId) {
        let node = self.node(id);
        let flags = if node.flags.is_empty() {
            ""
        } else {
            " [flags]"
        };
        let suffix = if !node.children.is_empty() {
            " <command>".to_string()
        } else if let Some(hint) = &node.usage {
            format!(" {hint}")
        } else {
            String::new()
        };
        let _ = writeln!(out, "Usage: {}{flags}{suffix}", self.path(id).join(" "));
    }

    fn write_flags(&self, out: &mut String, id: CommandId) {
        let flags = &self.node(id).flags;
        if flags.is_empty() {
            return;
        }

        let width = flags.iter().map(|f| f.label().len()).max().unwrap_or(0);
        out.push_str("Flags:\n");
        for flag in flags.iter() {
            let _ = write!(out, "  {:<width$}  {}", flag.label(), flag.description);
            if !flag.default.is_empty() {
                let _ = write!(out, " (default {:?})", flag.default);
            }
            out.push('\n');
        }
    }

    fn write_commands(&self, out: &mut String, id: CommandId) {
        let children = &self.node(id).children;
        if children.is_empty() {
            return;
        }

        let width = children.keys().map(String::len).max().unwrap_or(0);
        out.push_str("\nAvailable Commands:\n");
        // BTreeMap keeps the names sorted.
        for (name, child) in children {
            let description = &self.node(*child).description;
            let _ = writeln!(out, "     {name:>width$} {description}");
        }
    }
}
