use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "passhash", author, version, about)]
pub struct Cli {
    /// Hasher configuration file
    #[arg(short, long, global = true, value_names(["PATH"]))]
    pub config: Option<PathBuf>,

    /// Registered hasher to use instead of the default
    #[arg(long, global = true, value_names(["NAME"]))]
    pub hasher: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Hash a password
    Make {
        #[command(flatten)]
        password: Password,
    },
    /// Check a password against a stored hash
    Verify {
        hash: String,

        #[command(flatten)]
        password: Password,
    },
    /// Report whether a stored hash uses outdated settings
    NeedsRehash { hash: String },
    /// Report whether a stored hash is well formed
    Check { hash: String },
    /// Find the registered hasher that produced a stored hash
    Identify { hash: String },
    /// Show the fields of a PHC string
    Inspect { hash: String },
    /// List registered hashers
    List,
}

#[derive(Debug, Args)]
pub struct Password {
    /// Password to use, prompted for when missing
    #[arg(short, long)]
    pub password: Option<String>,
}
