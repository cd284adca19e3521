use thiserror::Error;

/// Failures raised by the arithmetic evaluator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Division by zero")]
    DivideByZero,

    #[error("Non-finite result: {0}")]
    NonFinite(String),
}

#[derive(Error, Debug)]
pub enum CoevoError {
    #[error("Invalid tree shape: {0}")]
    InvalidShape(String),

    #[error("Operation on an empty tree")]
    EmptyTree,

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Selection failure: {0}")]
    SelectionFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CoevoError>;
