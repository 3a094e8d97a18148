//! # Etiqueta CLI
//!
//! Command-line interface for label printing.
//!
//! ## Usage
//!
//! ```bash
//! # List paired printers
//! etiqueta peers
//!
//! # Connect once (persists the peer for later jobs)
//! etiqueta print text "HELLO" --address AA:BB:CC:DD:EE:FF
//!
//! # Subsequent jobs reconnect from the persisted record
//! etiqueta print text "LINE ONE\nLINE TWO"
//!
//! # Stripe calibration pattern
//! etiqueta print stripe "CALIBRATION"
//!
//! # Replay a pre-built command file
//! etiqueta print textfile --file hello_txt_command.txt
//! etiqueta print binfile --file capturescreen.bin
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use etiqueta::{
    connection::{PeerStore, SPP_SERVICE_ID},
    session::{PrintJob, PrintSession, SessionOptions},
    transport::RfcommRadio,
    EtiquetaError, PeerIdentity,
};

/// Etiqueta - TSC label printer utility
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of the persisted peer record
    #[arg(long, default_value = "device.json", global = true)]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List previously paired printers
    Peers,

    /// Send a print job
    Print {
        /// Job type
        #[arg(value_enum)]
        job: JobKind,

        /// Label text (text and stripe jobs)
        text: Option<String>,

        /// Pre-built command file (textfile and binfile jobs)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Printer address; connects and persists before printing
        #[arg(long)]
        address: Option<String>,

        /// Number of copies
        #[arg(long, default_value = "1")]
        copies: u32,

        /// Label height in mm
        #[arg(long, default_value = "10")]
        height: u32,

        /// Keep the channel warm instead of reconnecting after the job
        #[arg(long)]
        keep_alive: bool,

        /// Legacy mode: transmit the text job twice
        #[arg(long)]
        duplicate_send: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum JobKind {
    Text,
    Stripe,
    Textfile,
    Binfile,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), EtiquetaError> {
    match cli.command {
        Commands::Peers => {
            let session = PrintSession::new(
                Box::new(RfcommRadio::new()),
                PeerStore::new(cli.store),
                SessionOptions::default(),
            );
            session.initialize()?;
            for peer in session.list_peers()? {
                println!(
                    "{}  {}",
                    peer.address,
                    peer.name.as_deref().unwrap_or("(unnamed)")
                );
            }
            Ok(())
        }

        Commands::Print {
            job,
            text,
            file,
            address,
            copies,
            height,
            keep_alive,
            duplicate_send,
        } => {
            let mut options = SessionOptions {
                copies,
                reconnect_per_job: !keep_alive,
                duplicate_send,
                ..SessionOptions::default()
            };
            options.setup.height_mm = height;

            let session = PrintSession::new(
                Box::new(RfcommRadio::new()),
                PeerStore::new(cli.store),
                options,
            );
            session.initialize()?;

            if let Some(address) = address {
                session.connect(&PeerIdentity {
                    name: None,
                    address,
                    service_id: SPP_SERVICE_ID,
                })?;
            }

            let job = build_job(job, text, file)?;
            session.submit_job(&job)?;
            println!("Job sent.");
            Ok(())
        }
    }
}

fn build_job(
    kind: JobKind,
    text: Option<String>,
    file: Option<PathBuf>,
) -> Result<PrintJob, EtiquetaError> {
    match kind {
        JobKind::Text => Ok(PrintJob::Text {
            content: text
                .ok_or_else(|| EtiquetaError::InvalidText("text job needs label text".into()))?,
        }),
        JobKind::Stripe => Ok(PrintJob::StripeTest {
            content: text.unwrap_or_else(|| "STRIPE TEST".to_string()),
        }),
        JobKind::Textfile => Ok(PrintJob::TextFile {
            path: require_file(file)?,
        }),
        JobKind::Binfile => Ok(PrintJob::BinaryFile {
            path: require_file(file)?,
        }),
    }
}

fn require_file(file: Option<PathBuf>) -> Result<PathBuf, EtiquetaError> {
    file.ok_or_else(|| EtiquetaError::AssetLoadFailed {
        path: PathBuf::new(),
        reason: "file jobs need --file".to_string(),
    })
}
