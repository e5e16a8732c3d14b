//! Error type shared by the store, the pipeline service and the profile file.
//!
//! The CLI wraps these in `anyhow` for context; everything below `main`
//! returns [`Result`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection or query failure in the SQLite store.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("{what} #{id} not found")]
    NotFound { what: &'static str, id: String },

    #[error("stage '{0}' already exists")]
    StageExists(String),

    #[error("unknown stage '{name}'{}", suggestion.as_ref().map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default())]
    UnknownStage {
        name: String,
        suggestion: Option<String>,
    },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(what: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_stage_mentions_suggestion() {
        let err = Error::UnknownStage {
            name: "Technical".into(),
            suggestion: Some("Technical Loop".into()),
        };
        assert_eq!(
            err.to_string(),
            "unknown stage 'Technical' (did you mean 'Technical Loop'?)"
        );

        let err = Error::UnknownStage {
            name: "xyz".into(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown stage 'xyz'");
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("interview", 42);
        assert_eq!(err.to_string(), "interview #42 not found");
    }
}
