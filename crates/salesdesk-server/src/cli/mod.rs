use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod init;
pub mod tokens;

#[derive(Parser)]
#[command(name = "salesdesk-server")]
#[command(about = "SalesDesk Server CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run database migrations
    Migrate,
    /// Print OpenAPI spec (optionally to a file)
    Openapi(OpenApiArgs),
    /// Create a user and print a bearer token for it
    Init(init::InitArgs),
    /// Issue bearer tokens for existing users
    Token(tokens::TokenArgs),
}

#[derive(Args)]
struct OpenApiArgs {
    #[arg(long, short)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum RunMode {
    Server,
    Migrate,
    OpenApi { out: Option<PathBuf> },
    Init(init::InitArgs),
    Token(tokens::TokenArgs),
}

impl RunMode {
    /// Modes that never verify or sign tokens can start without a secret.
    pub fn needs_jwt_secret(&self) -> bool {
        !matches!(self, Self::Migrate | Self::OpenApi { .. })
    }
}

pub fn parse_args() -> RunMode {
    let cli = Cli::parse();
    match cli.command {
        None => RunMode::Server,
        Some(Command::Migrate) => RunMode::Migrate,
        Some(Command::Openapi(args)) => RunMode::OpenApi { out: args.out },
        Some(Command::Init(args)) => RunMode::Init(args),
        Some(Command::Token(args)) => RunMode::Token(args),
    }
}
