use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] skua_core::Error),

    #[error(transparent)]
    Browser(#[from] skua_browser::Error),

    #[error("session is not initialized; install it before running the suite")]
    SessionMissing,
}

pub type Result<T> = std::result::Result<T, Error>;
