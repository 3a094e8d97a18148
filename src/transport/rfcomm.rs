//! # Bluetooth RFCOMM Backend
//!
//! Real radio backend for Linux: paired peers come from `bluetoothctl`,
//! and the channel is an RFCOMM TTY device (`/dev/rfcommN`) bound to the
//! peer's address.
//!
//! ## Bluetooth Setup (Linux)
//!
//! The printer must be paired before this backend can reach it:
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# scan on
//! # Note the printer's address, e.g. AA:BB:CC:DD:EE:FF
//! [bluetooth]# pair AA:BB:CC:DD:EE:FF
//! ```
//!
//! `open_channel` reuses an existing `/dev/rfcommN` binding when one
//! exists, otherwise it runs `rfcomm bind` itself (root required).
//!
//! ## TTY Configuration
//!
//! The RFCOMM device is opened in raw mode so binary bitmap payloads pass
//! through unmodified: no input processing, no OPOST, 8-bit characters,
//! no echo, non-canonical. IXON/IXOFF are disabled because 0x11/0x13 can
//! occur in raster data.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::connection::{PeerIdentity, RadioAdapter, SPP_SERVICE_ID};
use crate::error::EtiquetaError;
use crate::transport::Channel;

/// How long to wait for `/dev/rfcommN` to appear after binding
const BIND_DEADLINE: Duration = Duration::from_secs(5);

/// Settle time after `bluetoothctl connect`
const CONNECT_SETTLE: Duration = Duration::from_millis(500);

// ============================================================================
// CHANNEL
// ============================================================================

/// An open RFCOMM TTY channel to a peer.
pub struct RfcommChannel {
    file: Option<File>,
    path: String,
}

impl RfcommChannel {
    /// Open an RFCOMM device and configure it for raw binary I/O.
    pub fn open(path: &str) -> Result<Self, EtiquetaError> {
        let file = OpenOptions::new().write(true).open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                EtiquetaError::PermissionDenied(format!(
                    "{}: not writable (dialout group membership required)",
                    path
                ))
            } else {
                EtiquetaError::ChannelOpenFailed(format!("failed to open {}: {}", path, e))
            }
        })?;

        configure_tty_raw(file.as_raw_fd())?;

        Ok(Self {
            file: Some(file),
            path: path.to_string(),
        })
    }

    fn live(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "channel closed"))
    }
}

impl Channel for RfcommChannel {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.live()?.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.live()?.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            debug!(path = %self.path, "closing rfcomm channel");
            file.flush()?;
        }
        Ok(())
    }
}

// ============================================================================
// RADIO ADAPTER
// ============================================================================

/// Radio backend driving the BlueZ userland tools.
///
/// Discovery state and the adapter handle live here; channels it opens are
/// handed off to the connection manager.
#[derive(Debug, Default)]
pub struct RfcommRadio;

impl RfcommRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `bluetoothctl` with the given arguments, capturing stdout.
    fn bluetoothctl(args: &[&str]) -> Result<String, EtiquetaError> {
        let output = Command::new("bluetoothctl").args(args).output().map_err(|e| {
            EtiquetaError::AdapterUnavailable(format!("failed to run bluetoothctl: {}", e))
        })?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl RadioAdapter for RfcommRadio {
    fn bind(&mut self) -> Result<(), EtiquetaError> {
        // `bluetoothctl list` prints one line per controller
        let controllers = Self::bluetoothctl(&["list"])?;
        if controllers.trim().is_empty() {
            return Err(EtiquetaError::AdapterUnavailable(
                "no Bluetooth controller found".to_string(),
            ));
        }
        debug!(controllers = controllers.trim(), "radio adapter bound");
        Ok(())
    }

    fn bonded_peers(&mut self) -> Result<Vec<PeerIdentity>, EtiquetaError> {
        let show = Self::bluetoothctl(&["show"])?;
        if show.contains("Powered: no") {
            return Err(EtiquetaError::RadioDisabled);
        }

        // Lines look like: "Device AA:BB:CC:DD:EE:FF TSC Alpha-3R"
        let listing = Self::bluetoothctl(&["devices", "Paired"])?;
        let mut peers = Vec::new();
        for line in listing.lines() {
            let mut parts = line.splitn(3, ' ');
            if parts.next() != Some("Device") {
                continue;
            }
            let Some(address) = parts.next() else { continue };
            if !is_valid_mac(address) {
                continue;
            }
            peers.push(PeerIdentity {
                name: parts.next().map(|s| s.trim().to_string()),
                address: address.to_string(),
                service_id: SPP_SERVICE_ID,
            });
        }
        debug!(count = peers.len(), "paired peers listed");
        Ok(peers)
    }

    fn cancel_discovery(&mut self) {
        // Discovery and connect cannot run concurrently on the radio.
        // Best effort: a failure here surfaces as an open failure later.
        if let Err(e) = Self::bluetoothctl(&["scan", "off"]) {
            warn!("failed to cancel discovery: {}", e);
        }
    }

    fn open_channel(
        &mut self,
        address: &str,
        service_id: &Uuid,
    ) -> Result<Box<dyn Channel>, EtiquetaError> {
        if !is_valid_mac(address) {
            return Err(EtiquetaError::ChannelOpenFailed(format!(
                "{} is not a valid Bluetooth address",
                address
            )));
        }
        if *service_id != SPP_SERVICE_ID {
            // RFCOMM binding always targets the SPP channel; a peer
            // advertising a different service still gets SPP here.
            debug!(%service_id, "non-SPP service id, binding SPP channel");
        }

        let device_path = match find_rfcomm_for_mac(address)? {
            Some(path) => path,
            None => bind_rfcomm(address, 0)?,
        };

        debug!(%address, device = %device_path, "opening rfcomm channel");
        Ok(Box::new(RfcommChannel::open(&device_path)?))
    }
}

// ============================================================================
// RFCOMM HELPERS
// ============================================================================

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Find an existing RFCOMM device bound to the given MAC address.
///
/// Reads `/proc/net/rfcomm` (format: `rfcomm0: XX:XX:XX:XX:XX:XX channel N`).
pub fn find_rfcomm_for_mac(mac: &str) -> Result<Option<String>, EtiquetaError> {
    let mac_upper = mac.to_uppercase();

    if let Ok(contents) = fs::read_to_string("/proc/net/rfcomm") {
        for line in contents.lines() {
            if !line.to_uppercase().contains(&mac_upper) {
                continue;
            }
            if let Some(dev_name) = line.split(':').next() {
                let device_path = format!("/dev/{}", dev_name.trim());
                if Path::new(&device_path).exists() {
                    return Ok(Some(device_path));
                }
            }
        }
    }

    Ok(None)
}

/// Bind an RFCOMM device for a Bluetooth MAC address.
///
/// Connects via `bluetoothctl`, then runs `rfcomm bind <n> <MAC> 1`
/// (RFCOMM channel 1 is standard for SPP) and waits for the device node
/// with a bounded deadline. Requires root privileges for the bind.
fn bind_rfcomm(mac: &str, rfcomm_index: u8) -> Result<String, EtiquetaError> {
    let mac_upper = mac.to_uppercase();
    let device_path = format!("/dev/rfcomm{}", rfcomm_index);

    debug!(%mac_upper, "connecting via bluetoothctl");
    let output = Command::new("bluetoothctl")
        .args(["connect", &mac_upper])
        .output()
        .map_err(|e| EtiquetaError::ChannelOpenFailed(format!("bluetoothctl: {}", e)))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Connection successful") && !stdout.contains("already connected") {
        // rfcomm bind can still succeed for an in-range device
        debug!("bluetoothctl returned: {}", stdout.trim());
    }
    thread::sleep(CONNECT_SETTLE);

    let output = Command::new("rfcomm")
        .args(["bind", &rfcomm_index.to_string(), &mac_upper, "1"])
        .output()
        .map_err(|e| EtiquetaError::ChannelOpenFailed(format!("rfcomm bind: {}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.contains("Operation not permitted") || stderr.contains("Permission denied") {
            return Err(EtiquetaError::PermissionDenied(format!(
                "rfcomm bind requires root: {}",
                stderr
            )));
        }
        return Err(EtiquetaError::ChannelOpenFailed(format!(
            "rfcomm bind failed: {}",
            stderr
        )));
    }

    let deadline = Instant::now() + BIND_DEADLINE;
    while !Path::new(&device_path).exists() {
        if Instant::now() >= deadline {
            return Err(EtiquetaError::ChannelOpenFailed(format!(
                "{} did not appear within {:?}",
                device_path, BIND_DEADLINE
            )));
        }
        thread::sleep(Duration::from_millis(100));
    }

    debug!(device = %device_path, "rfcomm device bound");
    Ok(device_path)
}

/// Configure a file descriptor for raw TTY mode.
///
/// Disables all input/output processing so binary data passes through
/// unmodified. IXON/IXOFF/IXANY matter most: 0x11 (XON) and 0x13 (XOFF)
/// appear routinely in bitmap payloads.
#[cfg(unix)]
fn configure_tty_raw(fd: i32) -> Result<(), EtiquetaError> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(EtiquetaError::ChannelOpenFailed(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(EtiquetaError::ChannelOpenFailed(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_fd: i32) -> Result<(), EtiquetaError> {
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_mac_addresses() {
        assert!(is_valid_mac("00:11:22:33:44:55"));
        assert!(is_valid_mac("AA:BB:CC:DD:EE:FF"));
        assert!(is_valid_mac("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn test_invalid_mac_addresses() {
        assert!(!is_valid_mac("00:11:22:33:44")); // too short
        assert!(!is_valid_mac("00:11:22:33:44:55:66")); // too long
        assert!(!is_valid_mac("00-11-22-33-44-55")); // wrong separator
        assert!(!is_valid_mac("GG:HH:II:JJ:KK:LL")); // invalid hex
        assert!(!is_valid_mac(""));
    }

    #[test]
    fn test_open_channel_rejects_bad_address() {
        let mut radio = RfcommRadio::new();
        // The Ok side holds a channel with no Debug impl, so inspect the
        // error without formatting the success value
        let result = radio.open_channel("not-a-mac", &SPP_SERVICE_ID);
        assert!(matches!(
            result.err(),
            Some(EtiquetaError::ChannelOpenFailed(_))
        ));
    }

    // Channel and bind paths need real hardware; exercised manually.
}
