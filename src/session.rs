//! # Print Session Facade
//!
//! The four operations the outside world uses: initialize, list peers,
//! connect, submit a print job. A job is sequenced into encoder calls and
//! transport writes per its type; the connection manager supplies (and if
//! needed recovers) the channel underneath every write.
//!
//! ## Reconnect-per-job
//!
//! By default every job ends with a disconnect followed by a fresh
//! reconnect, so the next job never inherits a stale half-open channel
//! from this one. Printers that hang mid-job otherwise poison every
//! subsequent print. The policy costs latency and can be turned off via
//! [`SessionOptions::reconnect_per_job`] for warm-channel reuse.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::connection::{ConnectionManager, PeerIdentity, PeerStore, RadioAdapter};
use crate::error::EtiquetaError;
use crate::protocol::commands::{self, LabelSetup, TextStyle};
use crate::render::BitmapBuffer;
use crate::transport::{write_framed, write_whole};

/// Stripe test geometry, carried over from the manual calibration job:
/// a 300x20 band at the label origin.
const STRIPE_WIDTH: u32 = 300;
const STRIPE_HEIGHT: u32 = 20;

/// A requested print output. Transient: built per call, fully consumed
/// by [`PrintSession::submit_job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintJob {
    /// Label text, one TEXT directive per line
    Text { content: String },

    /// Stripe calibration bitmap plus a text caption, sent as one buffer
    StripeTest { content: String },

    /// Pre-built textual command file, transmitted unmodified
    TextFile { path: PathBuf },

    /// Pre-built binary command file, transmitted unmodified
    BinaryFile { path: PathBuf },
}

/// Session-wide policies and encoder defaults.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Label geometry and quality settings for encoded jobs
    pub setup: LabelSetup,

    /// Text placement for encoded jobs
    pub text_style: TextStyle,

    /// Copies per print trigger
    pub copies: u32,

    /// Sets per print trigger
    pub sets: u32,

    /// Force a disconnect + reconnect cycle after every job
    pub reconnect_per_job: bool,

    /// Legacy mode: transmit the text job twice in immediate succession.
    /// Reproduces historical behavior some deployments depend on; off by
    /// default.
    pub duplicate_send: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            setup: LabelSetup::default(),
            text_style: TextStyle::default(),
            copies: 1,
            sets: 1,
            reconnect_per_job: true,
            duplicate_send: false,
        }
    }
}

/// The caller-facing printer session.
pub struct PrintSession {
    manager: ConnectionManager,
    options: SessionOptions,
}

impl PrintSession {
    /// Build a session over a radio backend and a peer store.
    pub fn new(radio: Box<dyn RadioAdapter>, store: PeerStore, options: SessionOptions) -> Self {
        Self {
            manager: ConnectionManager::new(radio, store),
            options,
        }
    }

    /// Bind the local radio adapter.
    pub fn initialize(&self) -> Result<(), EtiquetaError> {
        self.manager.initialize()
    }

    /// List previously paired peers.
    pub fn list_peers(&self) -> Result<Vec<PeerIdentity>, EtiquetaError> {
        self.manager.list_peers()
    }

    /// Connect to a peer and persist it for later recovery.
    pub fn connect(&self, peer: &PeerIdentity) -> Result<(), EtiquetaError> {
        self.manager.connect(peer)
    }

    /// Close the current channel, if any.
    pub fn disconnect(&self) {
        self.manager.disconnect()
    }

    /// Transmit one print job.
    ///
    /// The job is encoded and written per its type; any missing channel is
    /// recovered from the persisted peer record first. With
    /// `reconnect_per_job` set, the channel is torn down and re-established
    /// after the job regardless of its outcome.
    pub fn submit_job(&self, job: &PrintJob) -> Result<(), EtiquetaError> {
        let result = self.run_job(job);

        if self.options.reconnect_per_job {
            self.manager.disconnect();
            // The job already finished either way; a failed warm-up only
            // delays the next one.
            if let Err(e) = self.manager.ensure_connected() {
                warn!("post-job reconnect failed: {}", e);
            }
        }

        result
    }

    /// Access to the connection manager, mainly for state inspection.
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    fn run_job(&self, job: &PrintJob) -> Result<(), EtiquetaError> {
        match job {
            PrintJob::Text { content } => self.run_text_job(content),
            PrintJob::StripeTest { content } => self.run_stripe_job(content),
            PrintJob::TextFile { path } | PrintJob::BinaryFile { path } => {
                self.run_file_job(path)
            }
        }
    }

    /// setup -> CLS -> TEXT -> PRINT, each block framed individually.
    fn run_text_job(&self, content: &str) -> Result<(), EtiquetaError> {
        let blocks = [
            commands::setup(&self.options.setup),
            commands::cls(),
            commands::text(content, &self.options.text_style)?,
            commands::print(self.options.copies, self.options.sets),
        ];

        let passes = if self.options.duplicate_send { 2 } else { 1 };
        for pass in 0..passes {
            debug!(pass, "transmitting text job");
            for block in &blocks {
                self.manager.with_channel(|ch| write_framed(ch, block))?;
            }
        }
        Ok(())
    }

    /// One assembled buffer, written whole: the binary bitmap payload must
    /// not be split on delimiter bytes that happen to occur inside it.
    fn run_stripe_job(&self, content: &str) -> Result<(), EtiquetaError> {
        let stripe = BitmapBuffer::stripe(STRIPE_WIDTH, STRIPE_HEIGHT);
        let (directive, payload) = commands::bitmap(&stripe, 0, 0);

        let mut buffer = commands::setup(&self.options.setup);
        buffer.extend(commands::cls());
        buffer.extend(directive);
        buffer.extend(payload);
        buffer.extend(commands::text(content, &self.options.text_style)?);
        buffer.extend(commands::print(self.options.copies, self.options.sets));

        debug!(size = buffer.len(), "transmitting stripe test job");
        self.manager.with_channel(|ch| write_whole(ch, &buffer))
    }

    /// Pre-built command files go out exactly as stored.
    fn run_file_job(&self, path: &Path) -> Result<(), EtiquetaError> {
        let buffer = std::fs::read(path).map_err(|e| EtiquetaError::AssetLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), size = buffer.len(), "transmitting file job");
        self.manager.with_channel(|ch| write_framed(ch, &buffer))
    }
}
