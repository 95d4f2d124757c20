//! fedevent CLI - build, inspect, redact and verify federated room events.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{build, canonicalize, inspect, pubkey, redact, verify, versions};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "FEDEVENT_LOG";

#[derive(Parser)]
#[command(name = "fedevent")]
#[command(about = "Federated room event construction and verification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show canonical bytes for input JSON
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
    },
    /// Show the canonical redacted form of an event
    Redact {
        /// Input event file (or stdin if not provided)
        input: Option<String>,
    },
    /// List registered room versions
    Versions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build, hash and sign an event from a draft
    Build {
        /// Room version to build for
        #[arg(long)]
        room_version: String,
        /// Origin server name
        #[arg(long)]
        origin: String,
        /// Signing key id, e.g. ed25519:auto
        #[arg(long)]
        key_id: String,
        /// Hex-encoded 32-byte ed25519 seed
        #[arg(long)]
        seed: String,
        /// Draft JSON file (or stdin if not provided)
        input: Option<String>,
    },
    /// Ingest an untrusted event and summarise it
    Inspect {
        /// Room version the event belongs to
        #[arg(long)]
        room_version: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Input event file (or stdin if not provided)
        input: Option<String>,
    },
    /// Verify a server's signature on an event
    Verify {
        /// Room version the event belongs to
        #[arg(long)]
        room_version: String,
        /// Signing server name
        #[arg(long)]
        server: String,
        /// Key id the signature was made with
        #[arg(long)]
        key_id: String,
        /// Unpadded base64 ed25519 public key
        #[arg(long)]
        public_key: String,
        /// Input event file (or stdin if not provided)
        input: Option<String>,
    },
    /// Print the public key for a seed
    Pubkey {
        /// Hex-encoded 32-byte ed25519 seed
        #[arg(long)]
        seed: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Canonicalize { input } => canonicalize::run(input),
        Commands::Redact { input } => redact::run(input),
        Commands::Versions { json } => versions::run(json),
        Commands::Build {
            room_version,
            origin,
            key_id,
            seed,
            input,
        } => build::run(room_version, origin, key_id, seed, input),
        Commands::Inspect {
            room_version,
            json,
            input,
        } => inspect::run(room_version, json, input),
        Commands::Verify {
            room_version,
            server,
            key_id,
            public_key,
            input,
        } => verify::run(room_version, server, key_id, public_key, input),
        Commands::Pubkey { seed } => pubkey::run(seed),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
