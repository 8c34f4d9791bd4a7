use thiserror::Error;

/// errors raised while reading instances, configurations or writing results
#[derive(Error, Debug)]
pub enum BnpError {
    /// file system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// malformed instance line
    #[error("parse error at line {line}: {content:?}")]
    Parse {
        /// line number (starting at 1)
        line: usize,
        /// offending line
        content: String,
    },

    /// (de)serialization errors (configuration, statistics)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// invalid command line or configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

impl BnpError {
    /// creates a parse error
    pub fn parse(line: usize, content: impl Into<String>) -> Self {
        BnpError::Parse { line, content: content.into() }
    }

    /// creates a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        BnpError::Config(message.into())
    }
}
