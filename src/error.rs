//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.
//!
//! The variants map one-to-one onto the failure modes of the connection
//! state machine and the transport, so callers can tell "permission
//! problem" apart from "peer unreachable" apart from "mid-transmission
//! I/O error" instead of getting a bare boolean.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for etiqueta operations
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// An operation was called before `initialize()`
    #[error("connection manager is not initialized; call initialize() first")]
    NotInitialized,

    /// No Bluetooth adapter is present on this system
    #[error("no Bluetooth adapter available: {0}")]
    AdapterUnavailable(String),

    /// The adapter exists but is powered off
    #[error("Bluetooth is disabled; enable the adapter and try again")]
    RadioDisabled,

    /// The caller lacks authorization to use the radio or device node
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Opening a channel to the peer failed
    #[error("failed to open channel to peer: {0}")]
    ChannelOpenFailed(String),

    /// No live channel and recovery from the persisted record failed
    #[error("no connection: {0}")]
    NoConnection(String),

    /// Write/flush error mid-transmission
    #[error("I/O failure during transmission: {0}")]
    IoFailure(#[from] std::io::Error),

    /// A pre-built command file could not be loaded
    #[error("failed to load command asset {}: {reason}", path.display())]
    AssetLoadFailed { path: PathBuf, reason: String },

    /// Label text that cannot be embedded in a TEXT directive
    #[error("invalid label text: {0}")]
    InvalidText(String),
}
