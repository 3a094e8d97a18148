//! # Etiqueta - Label Printer Control Library
//!
//! Etiqueta drives TSC label printers over Bluetooth. It provides:
//!
//! - **Protocol implementation**: TSPL directive builders
//! - **Raster generation**: 1-bpp buffers for BITMAP payloads
//! - **Transport**: delimiter-framed, chunk-bounded writes over RFCOMM
//! - **Connection management**: persisted-peer reconnect state machine
//!
//! ## Quick Start
//!
//! ```no_run
//! use etiqueta::{
//!     connection::PeerStore,
//!     session::{PrintJob, PrintSession, SessionOptions},
//!     transport::RfcommRadio,
//! };
//!
//! let session = PrintSession::new(
//!     Box::new(RfcommRadio::new()),
//!     PeerStore::new("device.json"),
//!     SessionOptions::default(),
//! );
//!
//! session.initialize()?;
//!
//! // Pick a paired printer and remember it
//! let peers = session.list_peers()?;
//! session.connect(&peers[0])?;
//!
//! // Print a label; later jobs reconnect from the persisted record
//! session.submit_job(&PrintJob::Text {
//!     content: "HELLO".to_string(),
//! })?;
//!
//! # Ok::<(), etiqueta::EtiquetaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | TSPL directive builders |
//! | [`render`] | 1-bpp raster generation |
//! | [`transport`] | Framed writer and RFCOMM backend |
//! | [`connection`] | Connection manager and peer persistence |
//! | [`session`] | Caller-facing print session |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Tested against TSC Alpha-series portable label printers speaking TSPL
//! over Bluetooth SPP. Other TSPL printers should work with adjusted
//! label geometry.

pub mod connection;
pub mod error;
pub mod protocol;
pub mod render;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use connection::{ConnectionManager, PeerIdentity, PeerStore};
pub use error::EtiquetaError;
pub use session::{PrintJob, PrintSession, SessionOptions};
