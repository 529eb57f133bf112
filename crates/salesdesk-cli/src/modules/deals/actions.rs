use salesdesk_core::api::deals::MoveDealRequest;
use salesdesk_core::{Board, DropTarget};
use tracing::info;

use super::http::{fetch_board, move_deal};
use crate::cli_args::*;
use crate::modules::system::http::{print_json, print_json_response};
use crate::modules::system::CommandContext;

pub(crate) async fn handle_deal(args: DealArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    match args.command {
        DealCommand::Board(args) => {
            let board = Board::from(fetch_board(ctx, args.pipeline_id).await?);
            print_json(&board)?;
        }
        DealCommand::Move(args) => {
            let target = match (args.stage, args.onto) {
                (_, Some(deal_id)) => DropTarget::Deal(deal_id),
                (Some(stage_id), None) => DropTarget::Stage(stage_id),
                (None, None) => anyhow::bail!("either --stage or --onto is required"),
            };
            let mut board = Board::from(fetch_board(ctx, args.pipeline).await?);
            let Some(step) = board.move_deal(args.deal_id, target)? else {
                println!("Deal not moved");
                return Ok(());
            };
            info!(
                deal_id = %step.deal_id,
                to_stage = %step.to_stage,
                position = step.position,
                changes_stage = step.changes_stage(),
                "moving deal"
            );
            let payload = MoveDealRequest {
                stage_id: step.to_stage,
                position: i32::try_from(step.position)?,
            };
            let response = move_deal(ctx, step.deal_id, payload).await?;
            print_json_response(response).await?;
        }
    }
    Ok(())
}
