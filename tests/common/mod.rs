//! Shared mock radio backend for integration tests.
//!
//! Records every physical write (with its boundaries) into a transcript
//! shared across reconnects, so tests can assert on the exact byte stream
//! a printer would have received.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use etiqueta::connection::{PeerIdentity, RadioAdapter};
use etiqueta::error::EtiquetaError;
use etiqueta::transport::Channel;

/// Everything the "printer" saw, across all channels the radio opened.
#[derive(Default)]
pub struct Transcript {
    pub writes: Vec<Vec<u8>>,
    pub flushes: usize,
    pub closes: usize,
}

impl Transcript {
    pub fn bytes(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

pub struct MockChannel {
    transcript: Arc<Mutex<Transcript>>,
    open: bool,
}

impl Channel for MockChannel {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        self.transcript.lock().unwrap().writes.push(data.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.transcript.lock().unwrap().flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        self.transcript.lock().unwrap().closes += 1;
        Ok(())
    }
}

pub struct MockRadio {
    peers: Vec<PeerIdentity>,
    pub transcript: Arc<Mutex<Transcript>>,
    pub opens: Arc<AtomicUsize>,
    pub refuse_opens: Arc<AtomicBool>,
}

impl MockRadio {
    pub fn new(peers: Vec<PeerIdentity>) -> Self {
        Self {
            peers,
            transcript: Arc::new(Mutex::new(Transcript::default())),
            opens: Arc::new(AtomicUsize::new(0)),
            refuse_opens: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl RadioAdapter for MockRadio {
    fn bind(&mut self) -> Result<(), EtiquetaError> {
        Ok(())
    }

    fn bonded_peers(&mut self) -> Result<Vec<PeerIdentity>, EtiquetaError> {
        Ok(self.peers.clone())
    }

    fn cancel_discovery(&mut self) {}

    fn open_channel(
        &mut self,
        address: &str,
        _service_id: &Uuid,
    ) -> Result<Box<dyn Channel>, EtiquetaError> {
        if self.refuse_opens.load(Ordering::SeqCst) {
            return Err(EtiquetaError::ChannelOpenFailed("peer unreachable".into()));
        }
        if !self.peers.iter().any(|p| p.address == address) {
            return Err(EtiquetaError::ChannelOpenFailed(format!(
                "unknown address {}",
                address
            )));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockChannel {
            transcript: self.transcript.clone(),
            open: true,
        }))
    }
}
