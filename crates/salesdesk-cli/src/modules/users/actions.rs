use reqwest::Method;

use crate::cli_args::*;
use crate::modules::system::http::{
    append_params, build_params, opt_param, print_json_response, send_request,
};
use crate::modules::system::CommandContext;

pub(crate) async fn handle_user(args: UserArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let base = ctx.addr.trim_end_matches('/');
    match args.command {
        UserCommand::List(args) => {
            let mut url = format!("{base}/v1/users");
            let params = build_params([
                opt_param("limit", args.limit.map(|value| value.to_string())),
                opt_param("offset", args.offset.map(|value| value.to_string())),
            ]);
            append_params(&mut url, params);
            let response = send_request(ctx, Method::GET, url, None).await?;
            print_json_response(response).await?;
        }
        UserCommand::Get(args) => {
            let url = format!("{base}/v1/users/{}", args.id);
            let response = send_request(ctx, Method::GET, url, None).await?;
            print_json_response(response).await?;
        }
    }
    Ok(())
}
