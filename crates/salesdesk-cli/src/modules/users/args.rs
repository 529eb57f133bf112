use clap::{Args, Subcommand};
use uuid::Uuid;

#[derive(Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand)]
pub enum UserCommand {
    List(UserListArgs),
    Get(UserGetArgs),
}

#[derive(Args)]
pub struct UserListArgs {
    #[arg(long)]
    pub limit: Option<i64>,
    #[arg(long)]
    pub offset: Option<i64>,
}

#[derive(Args)]
pub struct UserGetArgs {
    pub id: Uuid,
}
