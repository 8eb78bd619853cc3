//! Helpful error types for CLI commands
//!
//! Errors carry what went wrong, what was being attempted, and what to try
//! next.

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Configuration missing, unreadable, or invalid
    pub fn config_unavailable(path: &Path, reason: &str) -> Self {
        Self::new(format!("Configuration not usable: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Edit the file and set source_dir and destination_dir: {}", path.display()),
                "TRY: Create a fresh template: assetrelay config init --force".to_string(),
                "TRY: Point at another file: --config <PATH>".to_string(),
            ])
    }

    /// Configuration file already present
    pub fn config_exists(path: &Path) -> Self {
        Self::new(format!("Configuration already exists: {}", path.display()))
            .with_context("Refusing to overwrite an existing configuration")
            .with_suggestions([
                "TRY: Inspect it: assetrelay config show".to_string(),
                "TRY: Overwrite it with the template: assetrelay config init --force".to_string(),
            ])
    }

    /// Ledger file cannot be read or parsed
    pub fn ledger_unreadable(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot read transfer ledger: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check the file is valid JSON: cat {}", path.display()),
                "TRY: Point at another ledger: --ledger <PATH>".to_string(),
            ])
    }

    /// Destination directory cannot be listed
    pub fn destination_unreadable(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot list destination directory: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check the directory exists: ls -la {}", path.display()),
                "TRY: Fix destination_dir in the configuration".to_string(),
            ])
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON object on stdout for `--json` callers.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": {
                "message": helpful.message,
                "context": helpful.context,
                "suggestions": helpful.suggestions,
            }
        }),
        None => serde_json::json!({
            "error": {
                "message": format!("{:#}", err),
                "context": null,
                "suggestions": [],
            }
        }),
    };
    println!("{}", payload);
}
