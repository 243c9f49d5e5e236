//! Domain error types.
//!
//! Only run-level failures live here. Per-item and per-ticker defects are
//! absorbed by the pipeline and the signal engine as drops and skips.

/// Top-level error type for newsdesk.
#[derive(Debug, thiserror::Error)]
pub enum NewsdeskError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("json error in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NewsdeskError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        NewsdeskError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&NewsdeskError> for std::process::ExitCode {
    fn from(err: &NewsdeskError) -> Self {
        let code: u8 = match err {
            NewsdeskError::Io(_) => 1,
            NewsdeskError::ConfigParse { .. }
            | NewsdeskError::ConfigMissing { .. }
            | NewsdeskError::ConfigInvalid { .. } => 2,
            NewsdeskError::Data { .. } | NewsdeskError::Json { .. } => 3,
        };
        std::process::ExitCode::from(code)
    }
}
