//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and either prints a
//! short human rendering or the same value as stable JSON.
//!
//! ```ignore
//! render(mode, &value, |v, w| writeln!(w, "{}", v.quest_id))
//! ```

use serde::Serialize;
use std::io::{self, Write};
use tagquest_core::QuestError;

/// Shared width for human separators.
pub const PRETTY_RULE_WIDTH: usize = 60;

/// Write a horizontal separator used by human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Labelled lines for people at a terminal.
    Human,
    /// Machine-readable JSON, one document per invocation.
    Json,
}

impl OutputMode {
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Structured error payload rendered on stderr.
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            hint: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        hint: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
            hint: Some(hint.into()),
        }
    }
}

impl From<&QuestError> for CliError {
    fn from(err: &QuestError) -> Self {
        Self {
            message: err.to_string(),
            code: Some(err.code().code().to_string()),
            hint: err.hint().map(str::to_string),
        }
    }
}

/// Render a value as JSON or through `human_fn`.
///
/// # Errors
///
/// Returns an error if serialization or writing to stdout fails.
pub fn render<T, F>(mode: OutputMode, value: &T, human_fn: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T, &mut dyn Write) -> io::Result<()>,
{
    let stdout = io::stdout();
    let mut w = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut w, value)?;
        writeln!(w)?;
    } else {
        human_fn(value, &mut w)?;
    }
    w.flush()?;
    Ok(())
}

/// Render an error to stderr.
///
/// # Errors
///
/// Returns an error if writing to stderr fails.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut w = stderr.lock();
    write_error(mode, error, &mut w)?;
    w.flush()?;
    Ok(())
}

fn write_error(mode: OutputMode, error: &CliError, w: &mut dyn Write) -> anyhow::Result<()> {
    if mode.is_json() {
        let wrapper = serde_json::json!({ "error": error });
        serde_json::to_writer_pretty(&mut *w, &wrapper)?;
        writeln!(w)?;
    } else {
        match &error.code {
            Some(code) => writeln!(w, "error[{code}]: {}", error.message)?,
            None => writeln!(w, "error: {}", error.message)?,
        }
        if let Some(hint) = &error.hint {
            writeln!(w, "  hint: {hint}")?;
        }
    }
    Ok(())
}

/// Report a controller failure in the active mode and turn it into an
/// `anyhow` error so the process exits non-zero.
#[must_use]
pub fn fail(mode: OutputMode, err: QuestError) -> anyhow::Error {
    if let Err(render_err) = render_error(mode, &CliError::from(&err)) {
        return render_err;
    }
    anyhow::Error::new(err)
}
