use anyhow::Result;
use clap::Parser;

use args::{Cli, Commands};
use passhash::HashManager;
use password::get_password;

mod args;
mod commands;
mod config;
mod password;
mod progress;

fn init_logger() {
    use std::io::Write;

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let color = buf.default_level_style(record.level());

            writeln!(
                buf,
                "{} {color}{}{color:#} - {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let args = Cli::parse();

    let config = config::load(args.config).await?;
    let manager = HashManager::try_from(&config)?;
    let hasher = args.hasher.as_deref();

    match args.command {
        Commands::Make { password } => {
            let password = get_password(password.password, true)?;

            commands::make(&manager, hasher, password).await?;
        }
        Commands::Verify { hash, password } => {
            let password = get_password(password.password, false)?;

            commands::verify(&manager, hasher, hash, password).await?;
        }
        Commands::NeedsRehash { hash } => commands::needs_rehash(&manager, hasher, &hash)?,
        Commands::Check { hash } => commands::check(&manager, hasher, &hash)?,
        Commands::Identify { hash } => commands::identify(&manager, &hash)?,
        Commands::Inspect { hash } => commands::inspect(&hash)?,
        Commands::List => commands::list(&manager),
    }

    Ok(())
}
