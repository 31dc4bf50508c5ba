//! Domain error types.

/// Top-level error type for btscreener.
///
/// Indicator and state-machine code never returns these: warm-up is expressed
/// with `None` and unmatched events are ignored. Only the outer layers
/// (config, data feed, broker, I/O) are fallible.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
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

    #[error("data feed error: {reason}")]
    DataFeed { reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("broker error: {reason}")]
    Broker { reason: String },

    #[error(transparent)]
    Universe(#[from] crate::domain::universe::UniverseError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) | ScreenerError::Csv(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. }
            | ScreenerError::Universe(_) => 2,
            ScreenerError::DataFeed { .. } => 3,
            ScreenerError::Broker { .. } => 4,
            ScreenerError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
