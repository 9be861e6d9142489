use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocQaError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

pub type Result<T> = std::result::Result<T, DocQaError>;
