use reqwest::Method;

use crate::cli_args::*;
use crate::modules::deals::handle_deal;
use crate::modules::groups::handle_group;
use crate::modules::system::http::{print_json_response, send_request};
use crate::modules::system::CommandContext;
use crate::modules::users::handle_user;

pub(crate) async fn handle_command(command: Command, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    match command {
        Command::Health => {
            let url = format!("{}/health", ctx.addr.trim_end_matches('/'));
            let response = send_request(ctx, Method::GET, url, None).await?;
            print_json_response(response).await?;
        }
        Command::Group(args) => handle_group(args, ctx).await?,
        Command::User(args) => handle_user(args, ctx).await?,
        Command::Deal(args) => handle_deal(args, ctx).await?,
        Command::Config(_) => unreachable!(),
    }

    Ok(())
}
