pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dmseal")]
#[command(about = "End-to-end encryption keys for direct messages")]
pub struct Args {
    /// Path to the dmseal state directory (defaults to ~/.dmseal)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level override (e.g. debug); RUST_LOG takes precedence
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
