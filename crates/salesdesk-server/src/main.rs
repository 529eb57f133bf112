#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cognitive_complexity)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::or_fun_call)]
#![allow(clippy::single_match_else)]
#![allow(clippy::unnecessary_wraps)]

use salesdesk_db::migrate;
use salesdesk_server::{bootstrap, cli, http, settings};

#[tokio::main]
async fn main() {
    let run_mode = cli::parse_args();
    if let cli::RunMode::OpenApi { out } = run_mode.clone() {
        let spec = http::openapi::build_openapi();
        let json = match serde_json::to_string_pretty(&spec) {
            Ok(json) => json,
            Err(err) => {
                eprintln!("failed to render openapi spec: {err}");
                std::process::exit(1);
            }
        };
        if let Some(path) = out {
            if let Err(err) = std::fs::write(&path, json) {
                eprintln!("failed to write openapi spec: {err}");
                std::process::exit(1);
            }
        } else {
            println!("{json}");
        }
        return;
    }
    let settings = match settings::Settings::from_env_with_options(run_mode.needs_jwt_secret()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    let sentry_guard = bootstrap::init_sentry(&settings);
    let sentry_enabled = sentry_guard.is_some();
    let otel_guard = bootstrap::init_tracing(sentry_enabled, &settings);
    let metrics_config = settings.config.metrics.clone();
    if run_mode.needs_jwt_secret() {
        if let Err(missing) = settings::preflight(&settings) {
            tracing::error!(
                event = "preflight_failed",
                missing = ?missing,
                "Required configuration missing"
            );
            std::process::exit(1);
        }
    }
    bootstrap::log_startup(&settings, &metrics_config);
    bootstrap::init_metrics_registry(&metrics_config);

    let db = match bootstrap::connect_db(&settings).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(event = "db_connect_failed", error = %err);
            std::process::exit(1);
        }
    };
    match run_mode {
        cli::RunMode::Migrate => {
            if let Err(err) = migrate(&db).await {
                tracing::error!(event = "migrations_failed", error = %err);
                std::process::exit(1);
            }
            tracing::info!(event = "migrations_applied", "migrations applied");
            return;
        }
        cli::RunMode::Init(args) => {
            if let Err(err) = cli::init::run(&settings, &db, &args).await {
                eprintln!("{err}");
                std::process::exit(1);
            }
            return;
        }
        cli::RunMode::Token(args) => {
            if let Err(err) = cli::tokens::run(&settings, &db, &args).await {
                eprintln!("{err}");
                std::process::exit(1);
            }
            return;
        }
        cli::RunMode::Server | cli::RunMode::OpenApi { .. } => {}
    }

    let state = bootstrap::build_state(&settings, db);
    bootstrap::start_background_tasks(&settings, &state);
    let app = bootstrap::build_app(&metrics_config, state);
    bootstrap::serve(&settings, app).await;

    drop(otel_guard);
    drop(sentry_guard);
}
