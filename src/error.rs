//! Engine error type.
//!
//! Every failure that escapes a stage method is an [`EngineError`]. The
//! `Display` output is always a single line so the application boundary can
//! show it verbatim in a fatal message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading content or running a stage.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed kind or stage definition, detected at construction time.
    #[error("definition error: {0}")]
    Definition(String),
    /// An error raised by a script callback or while evaluating a script file.
    #[error("script error: {}", single_line(.0))]
    Script(#[from] mlua::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid atlas file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unknown stage '{0}'")]
    UnknownStage(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn definition(message: impl Into<String>) -> Self {
        EngineError::Definition(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Collapses a Lua error (which may carry a multi-line traceback) into one line.
fn single_line(err: &mlua::Error) -> String {
    let text = match err {
        mlua::Error::CallbackError { cause, .. } => return single_line(cause),
        other => other.to_string(),
    };
    text.lines()
        .map(str::trim)
        .take_while(|l| *l != "stack traceback:")
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_errors_render_on_one_line() {
        let err = EngineError::Script(mlua::Error::RuntimeError(
            "objects/coin.lua:3: boom\nstack traceback:\n\t[C]: in ?".into(),
        ));
        let text = err.to_string();
        assert!(!text.contains('\n'));
        assert!(text.contains("boom"));
    }

    #[test]
    fn definition_error_message() {
        let err = EngineError::definition("kind 'coin' has no animation 'spin'");
        assert_eq!(
            err.to_string(),
            "definition error: kind 'coin' has no animation 'spin'"
        );
    }
}
