//! # Connection Management
//!
//! This module owns the single active channel to the printer and the
//! state machine around it:
//!
//! ```text
//! Uninitialized -> Disconnected -> Connected -> Disconnected -> ...
//! ```
//!
//! Every transport write asks the manager for a live channel first; if the
//! channel is gone the manager makes exactly one recovery attempt from the
//! persisted peer record before failing the write with `NoConnection`.
//!
//! All mutable state sits behind one mutex, so concurrent callers are
//! serialized by construction.

use std::sync::Mutex;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::EtiquetaError;
use crate::transport::Channel;

pub mod store;

pub use store::{PeerStore, PersistedPeerRecord};

/// Well-known Serial Port Profile service identifier.
///
/// Used when a peer does not advertise a service of its own.
pub const SPP_SERVICE_ID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Identity of a remote printer reachable over a paired radio link.
///
/// Immutable once constructed, at discovery or deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    /// Human-readable device name, when the peer advertises one
    pub name: Option<String>,

    /// Stable hardware address (Bluetooth MAC)
    pub address: String,

    /// Service identifier used to open the channel
    pub service_id: Uuid,
}

/// Platform radio stack, as seen by the connection manager.
///
/// The real backend is [`RfcommRadio`](crate::transport::RfcommRadio);
/// tests plug in an in-memory mock.
pub trait RadioAdapter: Send {
    /// Bind the local adapter handle.
    ///
    /// Fails with [`EtiquetaError::AdapterUnavailable`] when the platform
    /// has no radio hardware.
    fn bind(&mut self) -> Result<(), EtiquetaError>;

    /// List previously paired peers.
    fn bonded_peers(&mut self) -> Result<Vec<PeerIdentity>, EtiquetaError>;

    /// Cancel any in-progress discovery.
    ///
    /// Discovery and connection cannot run concurrently on the radio, so
    /// this is called before every channel open. Best effort.
    fn cancel_discovery(&mut self);

    /// Open a reliable byte-stream channel to the peer.
    fn open_channel(
        &mut self,
        address: &str,
        service_id: &Uuid,
    ) -> Result<Box<dyn Channel>, EtiquetaError>;
}

/// Observable connection state, without the channel itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Uninitialized,
    Disconnected,
    Connected,
}

enum State {
    Uninitialized,
    Disconnected,
    Connected(Box<dyn Channel>),
}

struct Inner {
    radio: Box<dyn RadioAdapter>,
    store: PeerStore,
    state: State,
}

/// Owner of the active channel and the connect/reconnect/disconnect
/// state machine.
///
/// A `Connected` state always wraps a channel that was successfully opened
/// and not yet explicitly closed; a half-open or permission-denied channel
/// is never exposed as connected.
pub struct ConnectionManager {
    inner: Mutex<Inner>,
}

impl ConnectionManager {
    /// Create a manager over the given radio backend and peer store.
    ///
    /// The manager starts `Uninitialized`; call [`initialize`] before
    /// listing peers.
    ///
    /// [`initialize`]: ConnectionManager::initialize
    pub fn new(radio: Box<dyn RadioAdapter>, store: PeerStore) -> Self {
        Self {
            inner: Mutex::new(Inner {
                radio,
                store,
                state: State::Uninitialized,
            }),
        }
    }

    /// Bind the local radio adapter.
    ///
    /// Idempotent: re-initializing an already initialized manager does not
    /// disturb an open channel.
    pub fn initialize(&self) -> Result<(), EtiquetaError> {
        let mut inner = self.lock();
        inner.radio.bind()?;
        if matches!(inner.state, State::Uninitialized) {
            inner.state = State::Disconnected;
        }
        Ok(())
    }

    /// List previously paired peers.
    pub fn list_peers(&self) -> Result<Vec<PeerIdentity>, EtiquetaError> {
        let mut inner = self.lock();
        if matches!(inner.state, State::Uninitialized) {
            return Err(EtiquetaError::NotInitialized);
        }
        inner.radio.bonded_peers()
    }

    /// Open a channel to the peer and persist its identity.
    ///
    /// Cancels any in-progress discovery first. The persisted record is
    /// overwritten only after the channel is confirmed open, so a failed
    /// connect never clobbers a usable previous record. An already open
    /// channel to another peer is closed before the new one replaces it.
    pub fn connect(&self, peer: &PeerIdentity) -> Result<(), EtiquetaError> {
        let mut inner = self.lock();

        if matches!(inner.state, State::Uninitialized) {
            inner.radio.bind()?;
            inner.state = State::Disconnected;
        }

        inner.radio.cancel_discovery();
        let channel = inner.radio.open_channel(&peer.address, &peer.service_id)?;

        if matches!(inner.state, State::Connected(_)) {
            inner.teardown();
        }
        inner.state = State::Connected(channel);

        // The channel is live either way; a record that failed to persist
        // only costs a future recovery attempt.
        if let Err(e) = inner.store.save(peer) {
            warn!("failed to persist peer record: {}", e);
        }

        debug!(address = %peer.address, "connected");
        Ok(())
    }

    /// Run `f` against a live channel, recovering one if necessary.
    ///
    /// This is the single entry point for transport writes: the mutex is
    /// held for the whole closure, so writes from concurrent callers never
    /// interleave.
    ///
    /// Recovery reinitializes the adapter when needed, loads the persisted
    /// peer record and reopens a channel from it. A single attempt: if it
    /// fails, the state stays `Disconnected` and the pending write fails
    /// with [`EtiquetaError::NoConnection`].
    pub fn with_channel<T>(
        &self,
        f: impl FnOnce(&mut dyn Channel) -> Result<T, EtiquetaError>,
    ) -> Result<T, EtiquetaError> {
        let mut inner = self.lock();
        inner.ensure_connected()?;
        match inner.state {
            State::Connected(ref mut channel) => f(channel.as_mut()),
            _ => unreachable!("ensure_connected left a non-connected state"),
        }
    }

    /// Re-establish a channel if none is open, without writing anything.
    pub fn ensure_connected(&self) -> Result<(), EtiquetaError> {
        self.lock().ensure_connected()
    }

    /// Close the current channel, if any.
    ///
    /// Idempotent and best-effort: flush and close errors are logged and
    /// swallowed; the state always ends `Disconnected`.
    pub fn disconnect(&self) {
        let mut inner = self.lock();
        inner.teardown();
    }

    /// Current state, for callers and tests.
    pub fn status(&self) -> ConnectionStatus {
        match self.lock().state {
            State::Uninitialized => ConnectionStatus::Uninitialized,
            State::Disconnected => ConnectionStatus::Disconnected,
            State::Connected(_) => ConnectionStatus::Connected,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-transition; the state enum is
        // still coherent, so continue rather than poison every caller.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Inner {
    fn ensure_connected(&mut self) -> Result<(), EtiquetaError> {
        if matches!(self.state, State::Connected(_)) {
            return Ok(());
        }

        if matches!(self.state, State::Uninitialized) {
            self.radio
                .bind()
                .map_err(|e| EtiquetaError::NoConnection(format!("adapter bind failed: {}", e)))?;
            self.state = State::Disconnected;
        }

        let peer = match self.store.load() {
            Ok(Some(peer)) => peer,
            Ok(None) => {
                return Err(EtiquetaError::NoConnection(
                    "no persisted peer record".to_string(),
                ));
            }
            Err(e) => {
                return Err(EtiquetaError::NoConnection(format!(
                    "peer record unreadable: {}",
                    e
                )));
            }
        };

        debug!(address = %peer.address, "recovering connection from persisted record");
        self.radio.cancel_discovery();
        match self.radio.open_channel(&peer.address, &peer.service_id) {
            Ok(channel) => {
                self.state = State::Connected(channel);
                Ok(())
            }
            Err(e) => {
                self.state = State::Disconnected;
                Err(EtiquetaError::NoConnection(format!(
                    "reconnect to {} failed: {}",
                    peer.address, e
                )))
            }
        }
    }

    /// Flush and close the channel, logging but never propagating errors.
    fn teardown(&mut self) {
        if !matches!(self.state, State::Connected(_)) {
            return;
        }
        if let State::Connected(mut channel) =
            std::mem::replace(&mut self.state, State::Disconnected)
        {
            if let Err(e) = channel.flush() {
                warn!("flush before close failed: {}", e);
            }
            if let Err(e) = channel.close() {
                warn!("channel close failed: {}", e);
            }
            debug!("disconnected");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
