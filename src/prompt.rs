//! User input and interaction handling.

use dialoguer::Input;

use crate::error::{Error, Result};

/// Trait for asking the user for values the command line did not provide.
pub trait Prompter {
    /// Asks for a single word (no whitespace).
    fn word(&self, prompt: &str) -> Result<String>;
}

/// Terminal prompter built on dialoguer.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn word(&self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .validate_with(|input: &String| validate_no_whitespace(input))
            .interact_text()
            .map_err(|e| Error::PromptError(e.to_string()))
    }
}

/// Rejects input containing spaces, tabs or line breaks.
pub fn validate_no_whitespace(input: &str) -> std::result::Result<(), String> {
    if input.chars().any(|c| matches!(c, ' ' | '\t' | '\r' | '\n')) {
        Err("Only strings are allowed (no spaces)".to_string())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_no_whitespace() {
        assert!(validate_no_whitespace("github.com/abates/waffle").is_ok());
        assert!(validate_no_whitespace("").is_ok());
        assert!(validate_no_whitespace("two words").is_err());
        assert!(validate_no_whitespace("tab\there").is_err());
        assert!(validate_no_whitespace("line\n").is_err());
    }
}
