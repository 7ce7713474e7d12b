// CLI modules
mod args;
mod op;
mod ops;
mod state;

// Local stand-ins for the key directory and logging
mod directory;
mod logging;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Backup, Decrypt, Encrypt, Init, Key, Logout, Peer, Version};
use state::AppState;

command_enum! {
    (Init, Init),
    (Key, Key),
    (Peer, Peer),
    (Encrypt, Encrypt),
    (Decrypt, Decrypt),
    (Backup, Backup),
    (Logout, Logout),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let ctx = op::OpContext::new(args.config_path);

    // the config may not exist yet (init), so fall back to defaults
    let config = AppState::load(ctx.config_path.clone())
        .ok()
        .map(|state| state.config);
    let level = args
        .log_level
        .or_else(|| config.as_ref().map(|c| c.log_level.clone()))
        .unwrap_or_else(|| "warn".to_string());
    let log_dir = config.and_then(|c| c.log_dir);

    let guards = match logging::init_logging(&level, log_dir.as_deref()) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush the non-blocking writers before exiting
    drop(guards);
    std::process::exit(code);
}
