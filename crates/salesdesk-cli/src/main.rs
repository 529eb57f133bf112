use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod cli_command;
mod modules;

use crate::cli_args::*;
use crate::cli_command::handle_command;
use crate::modules::system::{
    ensure_secure_addr, handle_config_command, load_config, resolve_target, save_config,
    CommandContext,
};

pub(crate) const DEFAULT_ADDR: &str = "https://127.0.0.1:8080";
pub(crate) const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let mut config = load_config()?;

    match cli.command {
        Command::Config(args) => {
            handle_config_command(args, &mut config)?;
            save_config(&config)?;
        }
        command => {
            let target = resolve_target(
                cli.addr,
                cli.token,
                cli.timeout_seconds,
                cli.context,
                &config,
            )?;
            ensure_secure_addr(&target.addr, cli.insecure)?;
            let client = reqwest::Client::builder()
                .danger_accept_invalid_certs(cli.insecure)
                .timeout(target.timeout)
                .build()?;
            let ctx = CommandContext {
                client: &client,
                addr: &target.addr,
                allow_insecure: cli.insecure,
                access_token: target.token.unwrap_or_default(),
            };
            handle_command(command, &ctx).await?;
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
