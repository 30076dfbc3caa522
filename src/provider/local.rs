//! Offline provider backed by the SQLite factor store

use std::sync::Mutex;

use rusqlite::Connection;
use tracing::debug;

use super::{EmissionFactorProvider, ProviderError};
use crate::activity::ActivityQuery;
use crate::db;

pub struct LocalFactorProvider {
    conn: Mutex<Connection>,
}

impl LocalFactorProvider {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl EmissionFactorProvider for LocalFactorProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn estimate(&self, query: &ActivityQuery) -> Result<Option<f64>, ProviderError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| ProviderError::Store("factor store lock poisoned".to_string()))?;

        let Some(factor) =
            db::get_factor(&conn, query.activity_id).map_err(|e| ProviderError::Store(e.to_string()))?
        else {
            debug!(activity_id = query.activity_id, "No local factor stored");
            return Ok(None);
        };

        if factor.unit != query.unit {
            return Err(ProviderError::UnitMismatch {
                activity_id: factor.activity_id,
                stored: factor.unit,
                requested: query.unit,
            });
        }

        Ok(Some(query.quantity * factor.kg_co2e_per_unit))
    }
}
