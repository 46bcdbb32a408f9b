//! Command template rendering.
//!
//! The verification command is configured as a single string containing a
//! `<APP_FILE>` placeholder. At request time the placeholder is replaced
//! with the artifact's absolute path and the result is split into an
//! argument vector.

use std::borrow::Cow;

/// Placeholder token replaced with the artifact's absolute path.
pub const APP_FILE_PLACEHOLDER: &str = "<APP_FILE>";

/// Error type for command template operations.
#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    /// The template or rendered command contained no tokens.
    #[error("Command is empty")]
    Empty,
    /// The template contained the placeholder more than once.
    #[error("Command template contains more than one {APP_FILE_PLACEHOLDER} placeholder")]
    DuplicatePlaceholder,
}

/// A configured command template with an optional artifact placeholder.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    template: String,
}

impl CommandTemplate {
    /// Validate and wrap a template string.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Empty` if the template is blank and
    /// `CommandError::DuplicatePlaceholder` if `<APP_FILE>` appears more
    /// than once.
    pub fn new(template: impl Into<String>) -> Result<Self, CommandError> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(CommandError::Empty);
        }
        if template.matches(APP_FILE_PLACEHOLDER).count() > 1 {
            return Err(CommandError::DuplicatePlaceholder);
        }
        Ok(Self { template })
    }

    /// Substitute the artifact path and split into an argument vector.
    ///
    /// Splitting is plain whitespace splitting. Arguments containing
    /// spaces (including artifact paths with spaces) are not expressible;
    /// this mirrors how the upstream tool configuration behaves.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Empty` if the rendered command has no tokens.
    pub fn render(&self, artifact_path: &str) -> Result<Command, CommandError> {
        let expanded = self.template.replace(APP_FILE_PLACEHOLDER, artifact_path);
        Command::parse(&expanded)
    }

    /// Get the raw template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }
}

/// A fully rendered argument vector, program first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    tokens: Vec<String>,
}

impl Command {
    /// Split a command line into tokens on whitespace.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Empty` if the line contains no tokens.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let tokens: Vec<String> = line.split_whitespace().map(String::from).collect();
        if tokens.is_empty() {
            return Err(CommandError::Empty);
        }
        Ok(Self { tokens })
    }

    /// The program to launch.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    /// The arguments following the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// Shell-escaped rendering for log output.
    #[must_use]
    pub fn display(&self) -> String {
        self.tokens
            .iter()
            .map(|t| shell_escape::escape(Cow::from(t.as_str())).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholder() {
        let template = CommandTemplate::new("apksigner verify --verbose <APP_FILE>").unwrap();
        let command = template.render("/tmp/app.apk").unwrap();
        assert_eq!(command.program(), "apksigner");
        assert_eq!(
            command.args(),
            ["verify", "--verbose", "/tmp/app.apk"]
        );
    }

    #[test]
    fn test_render_without_placeholder() {
        let template = CommandTemplate::new("verify-tool --all").unwrap();
        let command = template.render("/tmp/app.apk").unwrap();
        assert_eq!(command.program(), "verify-tool");
        assert_eq!(command.args(), ["--all"]);
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(matches!(
            CommandTemplate::new("   "),
            Err(CommandError::Empty)
        ));
    }

    #[test]
    fn test_duplicate_placeholder_rejected() {
        assert!(matches!(
            CommandTemplate::new("tool <APP_FILE> <APP_FILE>"),
            Err(CommandError::DuplicatePlaceholder)
        ));
    }

    #[test]
    fn test_parse_empty_command() {
        assert!(matches!(Command::parse(""), Err(CommandError::Empty)));
        assert!(matches!(Command::parse("  \t "), Err(CommandError::Empty)));
    }

    #[test]
    fn test_display_escapes_tokens() {
        let command = Command::parse("echo $HOME").unwrap();
        assert_eq!(command.display(), "echo '$HOME'");
    }
}
