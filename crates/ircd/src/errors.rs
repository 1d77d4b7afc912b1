use thiserror::Error;

#[derive(Error, Debug)]
pub enum InternalIrcError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
