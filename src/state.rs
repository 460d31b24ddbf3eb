use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::errors::EngineError;
use crate::services::catalog::Catalog;
use crate::services::identity::IdentityProvider;
use crate::services::propagation::ChangeHub;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub catalog: Box<dyn Catalog>,
    pub identity: Box<dyn IdentityProvider>,
    pub hub: ChangeHub,
}

impl AppState {
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, EngineError> {
        self.db
            .lock()
            .map_err(|_| EngineError::Transient("database handle poisoned".to_string()))
    }
}
