use std::collections::BTreeSet;
use std::sync::Arc;

use reqwest::Method;
use salesdesk_core::api::groups::{AddMemberRequest, ReplaceMembersRequest};
use tracing::warn;

use super::api::{GroupListParams, GroupsApi};
use super::cache::QueryCache;
use super::http::HttpGroupsApi;
use super::queries::GroupQueries;
use super::reconcile::{GroupEditor, GroupForm, NotificationLevel};
use crate::cli_args::*;
use crate::modules::system::http::{
    print_empty_response, print_json, print_json_response, send_request,
};
use crate::modules::system::CommandContext;

pub(crate) async fn handle_group(args: GroupArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let base = ctx.addr.trim_end_matches('/');
    match args.command {
        GroupCommand::List(args) => {
            let queries =
                GroupQueries::new(HttpGroupsApi::from_context(ctx), Arc::new(QueryCache::new()));
            let params = GroupListParams {
                limit: args.limit,
                offset: args.offset,
                sort: args.sort,
            };
            let groups = queries.groups(&params).await?;
            print_json(&serde_json::json!({ "groups": groups }))?;
        }
        GroupCommand::Get(args) => {
            let url = format!("{base}/v1/groups/{}", args.id);
            let response = send_request(ctx, Method::GET, url, None).await?;
            print_json_response(response).await?;
        }
        GroupCommand::Create(args) => {
            let form = GroupForm {
                name: args.name,
                leader_id: args.leader,
            };
            let queries = group_queries(ctx).await;
            let mut editor = GroupEditor::create(queries);
            editor.set_leader(form.leader_id);
            for user_id in args.members {
                editor.queue_add(user_id);
            }
            save_and_print(&mut editor, &form).await?;
        }
        GroupCommand::Edit(args) => {
            let queries = group_queries(ctx).await;
            let group = queries.group(args.id).await?;
            let form = GroupForm {
                name: args.name.unwrap_or_else(|| group.name.clone()),
                leader_id: Some(args.leader.unwrap_or(group.leader_id)),
            };
            let mut editor = GroupEditor::edit(queries, group);
            editor.set_leader(form.leader_id);
            let users = editor.queries().cache().users().unwrap_or_default();
            let addable: BTreeSet<_> = editor
                .pending()
                .addable_candidates(&users, &editor.current_members())
                .into_iter()
                .map(|user| user.id)
                .collect();
            for user_id in args.add {
                if users.iter().any(|user| user.id == user_id) && !addable.contains(&user_id) {
                    warn!(user_id = %user_id, "user already belongs to the group");
                    continue;
                }
                editor.queue_add(user_id);
            }
            for user_id in args.remove {
                if !editor.queue_remove(user_id) {
                    warn!(user_id = %user_id, "the group leader cannot be removed");
                }
            }
            if !editor.has_unsaved_changes(&form) {
                println!("No changes");
                return Ok(());
            }
            save_and_print(&mut editor, &form).await?;
        }
        GroupCommand::Delete(args) => {
            let url = format!("{base}/v1/groups/{}", args.id);
            let response = send_request(ctx, Method::DELETE, url, None).await?;
            print_empty_response(response, "Group deleted").await?;
        }
        GroupCommand::SetMembers(args) => {
            let url = format!("{base}/v1/groups/{}/members", args.id);
            let payload = ReplaceMembersRequest {
                user_ids: args.user_ids,
            };
            let response =
                send_request(ctx, Method::PUT, url, Some(serde_json::to_value(&payload)?)).await?;
            print_json_response(response).await?;
        }
        GroupCommand::AddMember(args) => {
            let url = format!("{base}/v1/groups/{}/members", args.id);
            let payload = AddMemberRequest {
                user_id: args.user_id,
            };
            let response =
                send_request(ctx, Method::POST, url, Some(serde_json::to_value(&payload)?)).await?;
            print_json_response(response).await?;
        }
        GroupCommand::RemoveMember(args) => {
            let url = format!("{base}/v1/groups/{}/members/{}", args.id, args.user_id);
            let response = send_request(ctx, Method::DELETE, url, None).await?;
            print_empty_response(response, "Member removed").await?;
        }
    }
    Ok(())
}

/// Queries with the user directory preloaded so new members render by name.
async fn group_queries(ctx: &CommandContext<'_>) -> GroupQueries<HttpGroupsApi> {
    let queries = GroupQueries::new(HttpGroupsApi::from_context(ctx), Arc::new(QueryCache::new()));
    if let Err(err) = queries.users().await {
        warn!(error = %err, "could not load users; new members will show placeholders");
    }
    queries
}

async fn save_and_print<A: GroupsApi>(
    editor: &mut GroupEditor<A>,
    form: &GroupForm,
) -> anyhow::Result<()> {
    tracing::info!(
        member_changes = editor.pending().op_count(),
        "saving group"
    );
    let result = editor.save(form).await;
    tracing::debug!(
        state = ?editor.state(),
        saving = editor.is_saving(),
        pending_member_ops = editor.pending_member_ops(),
        "group save finished"
    );
    // Failures surface through the returned error.
    for note in editor.take_notifications() {
        if note.level == NotificationLevel::Success {
            eprintln!("{}", note.message);
        }
    }
    let group_id = result?;
    let group = editor.queries().group(group_id).await?;
    print_json(&group)
}
