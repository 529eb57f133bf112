use clap::{Args, Subcommand};
use salesdesk_core::{Identity, UserRole};
use salesdesk_db::repo::UserRepo;
use serde::Serialize;
use uuid::Uuid;

use crate::domains::auth::tokens::TokenKeys;
use crate::settings::Settings;

#[derive(Debug, Clone, Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum TokenCommand {
    /// Sign a token for a user, looked up by id or email
    Issue(IssueArgs),
}

#[derive(Debug, Clone, Args)]
pub struct IssueArgs {
    #[arg(long, conflicts_with = "email", required_unless_present = "email")]
    pub user_id: Option<Uuid>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub ttl_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
struct IssueOutput {
    user_id: Uuid,
    role: UserRole,
    expires_in: i64,
    token: String,
}

pub async fn run(
    settings: &Settings,
    db: &salesdesk_db::PgPool,
    args: &TokenArgs,
) -> Result<(), String> {
    match &args.command {
        TokenCommand::Issue(issue) => issue_token(settings, db, issue).await,
    }
}

async fn issue_token(
    settings: &Settings,
    db: &salesdesk_db::PgPool,
    args: &IssueArgs,
) -> Result<(), String> {
    let ttl = args
        .ttl_seconds
        .unwrap_or(settings.config.auth.token_ttl_seconds);
    if ttl <= 0 {
        return Err("invalid --ttl-seconds".to_string());
    }

    let repo = UserRepo::new(db);
    let lookup = match (args.user_id, args.email.as_deref()) {
        (Some(user_id), _) => repo.get_by_id(user_id).await,
        (None, Some(email)) => repo.get_by_email(email.trim()).await,
        (None, None) => return Err("missing --user-id or --email".to_string()),
    };
    let user = lookup
        .map_err(|err| format!("db_error: {err}"))?
        .ok_or_else(|| "user_not_found".to_string())?;

    let keys = TokenKeys::new(settings.jwt_secret.as_bytes(), &settings.config.auth);
    let token = keys
        .issue_with_ttl(&Identity::new(user.id, user.role), ttl)
        .map_err(|err| err.to_string())?;
    tracing::info!(
        event = "token_issued",
        user_id = %user.id,
        ttl_seconds = ttl,
        "Token issued"
    );

    let output = IssueOutput {
        user_id: user.id,
        role: user.role,
        expires_in: ttl,
        token,
    };
    let json = serde_json::to_string_pretty(&output).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}
