//! Domain error types.

/// A parse error with position information for rule expressions.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for traderules.
#[derive(Debug, thiserror::Error)]
pub enum TraderulesError {
    #[error("invalid rule: {reason}")]
    InvalidRule { reason: String },

    #[error("index {index} out of range for series '{series}' ({len} values)")]
    IndexOutOfRange {
        series: String,
        index: usize,
        len: usize,
    },

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("unknown series '{name}'")]
    UnknownSeries { name: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TraderulesError> for std::process::ExitCode {
    fn from(err: &TraderulesError) -> Self {
        let code: u8 = match err {
            TraderulesError::Io(_) => 1,
            TraderulesError::ConfigParse { .. } | TraderulesError::ConfigMissing { .. } => 2,
            TraderulesError::Data { .. } => 3,
            TraderulesError::RuleParse(_)
            | TraderulesError::InvalidRule { .. }
            | TraderulesError::UnknownSeries { .. } => 4,
            TraderulesError::IndexOutOfRange { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
