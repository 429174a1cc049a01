use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Screenshot error: {0}")]
    Screenshot(String),

    #[error("browser session is not launched")]
    NotLaunched,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] skua_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
