#![allow(dead_code)]

use std::env;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use chrono::Utc;
use salesdesk_core::{Deal, Group, Identity, Pipeline, PipelineStage, User, UserRole};
use salesdesk_db::repo::{DealRepo, GroupRepo, PipelineRepo, StageRepo, UserRepo};
use salesdesk_db::{migrate, PgPool};
use salesdesk_server::app::{build_router, AppState};
use salesdesk_server::config::{AuthConfig, ServerConfig};
use salesdesk_server::domains::access_control::policies::{PolicyRule, PolicySet};
use salesdesk_server::domains::access_control::policy_store::PolicyStore;
use salesdesk_server::settings::DbTxIsolation;
use salesdesk_server::tokens::TokenKeys;
use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgConnectOptions, Postgres};
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub const TEST_SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

pub fn load_policy_rules() -> Vec<PolicyRule> {
    static RULES: OnceLock<Vec<PolicyRule>> = OnceLock::new();
    RULES
        .get_or_init(|| {
            let policies_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("../../config/policies.default.yaml");
            serde_yaml::from_str(&std::fs::read_to_string(policies_path).expect("policy file"))
                .expect("parse policies")
        })
        .clone()
}

/// Fresh schema per test so tests never see each other's rows.
pub async fn setup_db() -> PgPool {
    let db_url =
        env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for Postgres tests");
    let schema = format!("salesdesk_test_{}", Uuid::now_v7().simple());
    let admin_options =
        PgConnectOptions::from_str(&db_url).expect("failed to parse TEST_DATABASE_URL");
    let admin_pool = PoolOptions::<Postgres>::new()
        .max_connections(1)
        .connect_with(admin_options.clone())
        .await
        .expect("connect admin pool");

    sqlx_core::query::query::<Postgres>(&format!("CREATE SCHEMA \"{schema}\""))
        .execute(&admin_pool)
        .await
        .expect("create schema");

    let options = admin_options.options([("search_path", schema.as_str())]);
    let pool = PoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("connect test pool");

    migrate(&pool).await.expect("migrate");
    pool
}

pub struct TestApp {
    pub app: axum::Router,
    pub pool: PgPool,
    pub tokens: Arc<TokenKeys>,
}

impl TestApp {
    pub async fn new() -> Self {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("salesdesk_server=debug"))
                .with_test_writer()
                .try_init();
        });

        let pool = setup_db().await;
        let config = ServerConfig::default();
        let tokens = Arc::new(TokenKeys::new(TEST_SECRET, &AuthConfig::default()));
        let state = AppState {
            db: pool.clone(),
            db_tx_isolation: DbTxIsolation::ReadCommitted,
            started_at: Instant::now(),
            tokens: tokens.clone(),
            config,
            policy_store: PolicyStore::new(PolicySet::from_rules(load_policy_rules())),
        };

        Self {
            app: build_router(state),
            pool,
            tokens,
        }
    }

    pub async fn seed_user(&self, name: &str, role: UserRole) -> User {
        let user = User {
            id: Uuid::now_v7(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_ascii_lowercase().replace(' ', ".")),
            role,
            created_at: Utc::now(),
        };
        UserRepo::new(&self.pool)
            .create(&user)
            .await
            .expect("create user");
        user
    }

    /// Seeds a user with `role` and returns it with a bearer token.
    pub async fn login_as(&self, name: &str, role: UserRole) -> (User, String) {
        let user = self.seed_user(name, role).await;
        let token = self
            .tokens
            .issue(&Identity::new(user.id, user.role))
            .expect("issue token");
        (user, token)
    }

    pub async fn seed_group(&self, name: &str, leader_id: Uuid) -> Group {
        let now = Utc::now();
        let group = Group {
            id: Uuid::now_v7(),
            name: name.to_string(),
            leader_id,
            created_at: now,
            updated_at: now,
        };
        GroupRepo::new(&self.pool)
            .create(&group)
            .await
            .expect("create group");
        group
    }

    pub async fn seed_pipeline(
        &self,
        name: &str,
        stages: &[&str],
    ) -> (Pipeline, Vec<PipelineStage>) {
        let pipeline = Pipeline {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        PipelineRepo::new(&self.pool)
            .create(&pipeline)
            .await
            .expect("create pipeline");
        let mut created = Vec::with_capacity(stages.len());
        for (position, stage_name) in stages.iter().enumerate() {
            let stage = PipelineStage {
                id: Uuid::now_v7(),
                pipeline_id: pipeline.id,
                name: (*stage_name).to_string(),
                position: i32::try_from(position).expect("stage position"),
            };
            StageRepo::new(&self.pool)
                .create(&stage)
                .await
                .expect("create stage");
            created.push(stage);
        }
        (pipeline, created)
    }

    pub async fn seed_deal(&self, title: &str, stage_id: Uuid, position: i32) -> Deal {
        let now = Utc::now();
        let deal = Deal {
            id: Uuid::now_v7(),
            title: title.to_string(),
            value_cents: 100_000,
            stage_id,
            owner_id: None,
            position,
            created_at: now,
            updated_at: now,
        };
        DealRepo::new(&self.pool)
            .create(&deal)
            .await
            .expect("create deal");
        deal
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder
            .body(Body::from(serde_json::to_vec(&body).expect("encode json")))
            .expect("request");
        self.dispatch(request).await
    }

    pub async fn get_json(&self, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty()).expect("request");
        self.dispatch(request).await
    }

    pub async fn send_empty(&self, method: Method, uri: &str, token: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty()).expect("request");
        let response = self.app.clone().oneshot(request).await.expect("response");
        response.status()
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json")
        };
        (status, json)
    }
}

/// Sorted user ids of a `members` array in a response body.
pub fn member_ids(body: &serde_json::Value) -> Vec<String> {
    let mut ids: Vec<String> = body["members"]
        .as_array()
        .expect("members array")
        .iter()
        .map(|member| member["user_id"].as_str().expect("user_id").to_string())
        .collect();
    ids.sort();
    ids
}
