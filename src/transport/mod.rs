//! # Printer Transport Layer
//!
//! This module moves encoded command bytes onto a channel.
//!
//! ## Available Transports
//!
//! - [`framed`]: delimiter-framed, chunked writer used for every job
//! - [`rfcomm`]: Bluetooth RFCOMM channel and radio backend (Linux)
//!
//! The writers are generic over the [`Channel`] trait so tests can swap in
//! an in-memory channel.

use std::io;

pub mod framed;
pub mod rfcomm;

pub use framed::{write_framed, write_whole, CHUNK_SIZE};
pub use rfcomm::{RfcommChannel, RfcommRadio};

/// A reliable, stream-oriented, bidirectional connection to a peer.
///
/// All operations block until the underlying radio stack completes them.
/// Implementations must deliver bytes in order.
pub trait Channel: Send {
    /// Write the entire buffer.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Force buffered bytes out to the peer.
    fn flush(&mut self) -> io::Result<()>;

    /// Close both directions. Further writes must fail.
    fn close(&mut self) -> io::Result<()>;
}
