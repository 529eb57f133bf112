use clap::{Args, Subcommand};
use uuid::Uuid;

#[derive(Args)]
pub struct DealArgs {
    #[command(subcommand)]
    pub command: DealCommand,
}

#[derive(Subcommand)]
pub enum DealCommand {
    #[command(about = "Show a pipeline board with deals in stage order")]
    Board(DealBoardArgs),
    #[command(about = "Move a deal to another stage or slot")]
    Move(DealMoveArgs),
}

#[derive(Args)]
pub struct DealBoardArgs {
    pub pipeline_id: Uuid,
}

#[derive(Args)]
pub struct DealMoveArgs {
    pub deal_id: Uuid,
    #[arg(long)]
    pub pipeline: Uuid,
    #[arg(long, help = "Drop at the end of this stage")]
    #[arg(conflicts_with = "onto", required_unless_present = "onto")]
    pub stage: Option<Uuid>,
    #[arg(long, help = "Drop onto this deal and take its slot")]
    pub onto: Option<Uuid>,
}
