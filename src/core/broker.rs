use crate::core::config::Config;
use crate::core::error::QmError;
use crate::core::schemas;
use crate::core::store::{Datastore, StoreSession};
use crate::core::time;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ulid::Ulid;

/// The Store Broker is the single entry point for datastore access.
/// It opens one session per datastore per top-level operation and records
/// every operation's outcome in an append-only audit log.
pub struct StoreBroker {
    config: Config,
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub op: String,
    pub datastores: Vec<String>,
    pub status: String,
}

impl StoreBroker {
    pub fn new(config: &Config) -> Self {
        Self {
            audit_log_path: config.data_dir.join(schemas::STORE_EVENTS_NAME),
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute a closure against one datastore. The session stays open for
    /// the whole closure; individual mutations still auto-commit.
    pub fn with_session<F, R>(&self, datastore: Datastore, op_name: &str, f: F) -> Result<R, QmError>
    where
        F: FnOnce(&StoreSession) -> Result<R, QmError>,
    {
        let session = StoreSession::open(&self.config, datastore)?;
        let result = f(&session);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(op_name, &[datastore], status)?;

        result
    }

    /// Execute a closure against a (source, destination) session pair, the
    /// shape every migration runs in. The destination is the source's peer.
    pub fn with_pair<F, R>(&self, source: Datastore, op_name: &str, f: F) -> Result<R, QmError>
    where
        F: FnOnce(&StoreSession, &StoreSession) -> Result<R, QmError>,
    {
        let src = StoreSession::open(&self.config, source)?;
        let dst = StoreSession::open(&self.config, source.peer())?;
        let result = f(&src, &dst);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(op_name, &[source, source.peer()], status)?;

        result
    }

    fn log_event(&self, op: &str, datastores: &[Datastore], status: &str) -> Result<(), QmError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: Ulid::new().to_string(),
            op: op.to_string(),
            datastores: datastores.iter().map(|d| d.name().to_string()).collect(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(QmError::Io)?;

        let line = serde_json::to_string(&ev)
            .map_err(|e| QmError::Validation(format!("audit event encode: {e}")))?;
        writeln!(f, "{}", line).map_err(QmError::Io)?;
        Ok(())
    }
}
