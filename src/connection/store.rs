//! # Persisted Peer Record
//!
//! The last successfully connected peer is written to a small JSON file so
//! a later process (or a write after a dropped channel) can reconnect
//! without the caller re-supplying the peer.
//!
//! Overwrite semantics: the file always reflects the *last* connected
//! peer, never a history. A missing file means "no prior peer"; a
//! malformed file is unreadable and recovery fails.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::connection::PeerIdentity;
use crate::error::EtiquetaError;

/// Durable copy of a [`PeerIdentity`], serialized as a flat JSON object.
///
/// No versioning, no migration: the record is tiny and rewritten wholesale
/// on every successful connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedPeerRecord {
    pub name: Option<String>,
    pub address: String,
    #[serde(rename = "serviceId")]
    pub service_id: Uuid,
}

impl From<&PeerIdentity> for PersistedPeerRecord {
    fn from(peer: &PeerIdentity) -> Self {
        Self {
            name: peer.name.clone(),
            address: peer.address.clone(),
            service_id: peer.service_id,
        }
    }
}

impl From<PersistedPeerRecord> for PeerIdentity {
    fn from(record: PersistedPeerRecord) -> Self {
        Self {
            name: record.name,
            address: record.address,
            service_id: record.service_id,
        }
    }
}

/// Storage for the persisted peer record.
#[derive(Debug, Clone)]
pub struct PeerStore {
    path: PathBuf,
}

impl PeerStore {
    /// Create a store backed by the given file path.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, if one exists.
    ///
    /// Returns `Ok(None)` when the file is absent. A file that exists but
    /// does not parse is an error; recovery treats it as "no usable peer".
    pub fn load(&self) -> Result<Option<PeerIdentity>, EtiquetaError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no persisted peer record");
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let record: PersistedPeerRecord = serde_json::from_str(&contents)
            .map_err(|e| EtiquetaError::IoFailure(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        Ok(Some(record.into()))
    }

    /// Overwrite the record with this peer's identity.
    pub fn save(&self, peer: &PeerIdentity) -> Result<(), EtiquetaError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let record = PersistedPeerRecord::from(peer);
        std::fs::write(&self.path, serde_json::to_string(&record).map_err(io::Error::from)?)?;
        debug!(path = %self.path.display(), address = %peer.address, "peer record saved");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
