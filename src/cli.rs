use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "timecapsule")]
#[command(about = "Seal a message and files into an encrypted capsule that opens on a chosen date", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    /// Storage root (default: $TIMECAPSULE_HOME, then ./time_capsules)
    #[arg(long, global = true)]
    pub(crate) home: Option<PathBuf>,
    /// Key file (default: $TIMECAPSULE_KEY_FILE, config key_file, then <home>/capsule.key)
    #[arg(long, global = true)]
    pub(crate) key_file: Option<PathBuf>,
    /// Seal with a passphrase read from this environment variable instead of a key file
    #[arg(long, global = true)]
    pub(crate) passphrase_env: Option<String>,
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub(crate) verbose: u8,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a new key file and print its fingerprint.
    Keygen {
        /// Where to write the key (defaults to the resolved key file)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Replace an existing key file. Capsules sealed with it become unreadable.
        #[arg(long)]
        force: bool,
    },

    /// Seal a message (and optional files) until the unlock date.
    Create {
        #[arg(short, long)]
        title: String,
        /// Message text
        #[arg(short, long)]
        message: Option<String>,
        /// Read the message from a file (overrides --message)
        #[arg(long)]
        message_file: Option<PathBuf>,
        /// Unlock date (DD-MM-YYYY)
        #[arg(short, long)]
        unlock: String,
        /// Attach a file (repeatable)
        #[arg(short, long = "file")]
        files: Vec<String>,
        /// Comma-separated list of files to attach
        #[arg(long)]
        file_list: Option<String>,
        /// Fail if any attachment is missing instead of skipping it
        #[arg(long)]
        strict: bool,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },

    /// Open a capsule: prints the message and extracts files once unlocked.
    Open {
        capsule: PathBuf,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a capsule's title and dates without revealing its message.
    Inspect {
        capsule: PathBuf,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// List capsules in the storage root.
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive menu (create / open / exit).
    Menu,
}
