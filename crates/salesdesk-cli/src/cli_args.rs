use clap::{ArgAction, Parser, Subcommand};

pub use crate::modules::deals::args::*;
pub use crate::modules::groups::args::*;
pub use crate::modules::system::args::*;
pub use crate::modules::users::args::*;

#[derive(Parser)]
#[command(name = "salesdesk")]
#[command(about = "Salesdesk CRM back office CLI")]
pub struct Cli {
    #[arg(long, env = "SALESDESK_ADDR")]
    pub addr: Option<String>,
    #[arg(long, env = "SALESDESK_TOKEN")]
    pub token: Option<String>,
    #[arg(long)]
    pub context: Option<String>,
    #[arg(long, help = "Request timeout in seconds")]
    pub timeout_seconds: Option<u64>,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(long, help = "Allow http:// and invalid TLS certificates")]
    pub insecure: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Check that the server is up")]
    Health,
    Group(GroupArgs),
    User(UserArgs),
    Deal(DealArgs),
    Config(ConfigArgs),
}
