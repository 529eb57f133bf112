use chrono::Utc;
use clap::Args;
use salesdesk_core::{Identity, User, UserRole};
use salesdesk_db::repo::UserRepo;
use serde::Serialize;
use uuid::Uuid;

use crate::domains::auth::tokens::TokenKeys;
use crate::settings::Settings;

#[derive(Debug, Clone, Args)]
pub struct InitArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "admin", value_parser = parse_role)]
    pub role: UserRole,
}

pub(crate) fn parse_role(value: &str) -> Result<UserRole, String> {
    value.parse::<UserRole>().map_err(|err| err.to_string())
}

#[derive(Debug, Serialize)]
struct InitOutput {
    user_id: Uuid,
    name: String,
    email: String,
    role: UserRole,
    token: String,
}

pub async fn run(
    settings: &Settings,
    db: &salesdesk_db::PgPool,
    args: &InitArgs,
) -> Result<(), String> {
    let name = args.name.trim();
    let email = args.email.trim();
    if name.is_empty() {
        return Err("invalid_name".to_string());
    }
    if !email.contains('@') {
        return Err("invalid_email".to_string());
    }

    let repo = UserRepo::new(db);
    match repo.get_by_email(email).await {
        Ok(Some(_)) => return Err("email_taken".to_string()),
        Ok(None) => {}
        Err(err) => return Err(format!("db_error: {err}")),
    }

    let user = User {
        id: Uuid::now_v7(),
        name: name.to_string(),
        email: email.to_string(),
        role: args.role,
        created_at: Utc::now(),
    };
    repo.create(&user)
        .await
        .map_err(|err| format!("db_error: {err}"))?;

    let keys = TokenKeys::new(settings.jwt_secret.as_bytes(), &settings.config.auth);
    let token = keys
        .issue(&Identity::new(user.id, user.role))
        .map_err(|err| err.to_string())?;
    tracing::info!(
        event = "user_initialized",
        user_id = %user.id,
        role = user.role.as_str(),
        "User created"
    );

    let output = InitOutput {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        token,
    };
    let json = serde_json::to_string_pretty(&output).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}
