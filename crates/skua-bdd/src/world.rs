use crate::session::Session;
use crate::{Error, Result};
use cucumber::World;
use std::sync::{Arc, OnceLock};

static SESSION: OnceLock<Arc<Session>> = OnceLock::new();

/// Install the run-wide session before starting the suite. Later calls
/// are ignored; the first session wins.
pub fn install_session(session: Arc<Session>) {
    let _ = SESSION.set(session);
}

/// Per-scenario cucumber world. Worlds come and go with scenarios, but
/// they all share the run's single browser session.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct SessionWorld {
    pub session: Arc<Session>,
}

impl SessionWorld {
    async fn new() -> Result<Self> {
        let session = SESSION.get().cloned().ok_or(Error::SessionMissing)?;
        Ok(Self { session })
    }
}
