use std::env;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::config::{MetricsProfile, ServerConfig};
use crate::domains::access_control::policies::PolicySet;

pub(super) fn load_config(path: &str) -> ServerConfig {
    if !Path::new(path).exists() {
        return ServerConfig::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(event = "config_read_failed", path, error = %err);
            return ServerConfig::default();
        }
    };
    match serde_yaml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!(event = "config_parse_failed", path, error = %err);
            ServerConfig::default()
        }
    }
}

pub(super) fn apply_auth_env_overrides(config: &mut ServerConfig) {
    if let Ok(value) = env::var("SALESDESK_AUTH_ISSUER") {
        let value = value.trim();
        if value.is_empty() {
            warn!(event = "config_invalid", field = "SALESDESK_AUTH_ISSUER", value = %value);
        } else {
            config.auth.issuer = value.to_string();
        }
    }
    if let Ok(value) = env::var("SALESDESK_AUTH_AUDIENCE") {
        let value = value.trim();
        config.auth.audience = (!value.is_empty()).then(|| value.to_string());
    }
    if let Ok(value) = env::var("SALESDESK_AUTH_TOKEN_TTL_SECONDS") {
        match value.trim().parse::<i64>() {
            Ok(ttl) if ttl > 0 => config.auth.token_ttl_seconds = ttl,
            _ => warn!(
                event = "config_invalid",
                field = "SALESDESK_AUTH_TOKEN_TTL_SECONDS",
                value = %value
            ),
        }
    }
}

pub(super) fn apply_tracing_env_overrides(config: &mut ServerConfig) {
    if let Ok(value) = env::var("SALESDESK_TRACING_OTEL_ENABLED") {
        if let Some(enabled) = parse_bool(&value) {
            config.tracing.otel.enabled = enabled;
        } else {
            warn!(
                event = "config_invalid",
                field = "SALESDESK_TRACING_OTEL_ENABLED",
                value = %value
            );
        }
    }
    if let Ok(value) = env::var("SALESDESK_TRACING_OTEL_ENDPOINT") {
        let value = value.trim();
        config.tracing.otel.endpoint = (!value.is_empty()).then(|| value.to_string());
    }
    if let Ok(value) = env::var("SALESDESK_TRACING_OTEL_SERVICE_NAME") {
        let value = value.trim();
        config.tracing.otel.service_name = (!value.is_empty()).then(|| value.to_string());
    }
}

pub(super) fn apply_metrics_env_overrides(config: &mut ServerConfig) {
    if let Ok(value) = env::var("SALESDESK_METRICS_ENABLED") {
        if let Some(enabled) = parse_bool(&value) {
            config.metrics.enabled = enabled;
        } else {
            warn!(
                event = "config_invalid",
                field = "SALESDESK_METRICS_ENABLED",
                value = %value
            );
        }
    }
    if let Ok(value) = env::var("SALESDESK_METRICS_ENDPOINT") {
        let value = value.trim();
        if !value.is_empty() {
            config.metrics.endpoint = value.to_string();
        }
    }
    if let Ok(value) = env::var("SALESDESK_METRICS_PROFILE") {
        if let Some(profile) = parse_metrics_profile(&value) {
            config.metrics.profile = Some(profile);
        } else {
            warn!(
                event = "config_invalid",
                field = "SALESDESK_METRICS_PROFILE",
                value = %value
            );
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_metrics_profile(value: &str) -> Option<MetricsProfile> {
    match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "prod" | "production" => Some(MetricsProfile::Prod),
        "staging" => Some(MetricsProfile::Staging),
        "debug" => Some(MetricsProfile::Debug),
        _ => None,
    }
}

pub(super) fn load_secret_env_or_file(
    var_name: &str,
    file_var_name: &str,
) -> Result<Option<String>, String> {
    if let Ok(value) = env::var(var_name) {
        return Ok(Some(value));
    }
    let Ok(path) = env::var(file_var_name) else {
        return Ok(None);
    };
    read_secret_file(&path)
        .map(Some)
        .map_err(|err| format!("{file_var_name} invalid: {err}"))
}

fn read_secret_file(path: &str) -> Result<String, String> {
    let value = fs::read_to_string(path)
        .map_err(|err| format!("secret file not accessible ({}): {}", path, err))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("secret file is empty ({})", path));
    }
    Ok(trimmed.to_string())
}

pub(super) fn load_policies(config: &ServerConfig) -> Result<PolicySet, String> {
    let Some(path) = config.policy.file.as_deref() else {
        return Err("policy file not configured".to_string());
    };

    if !Path::new(path).exists() {
        return Err(format!("policy file not found: {path}"));
    }

    let contents = fs::read_to_string(path).map_err(|err| {
        warn!(event = "policy_read_failed", path, error = %err);
        format!("policy file read failed: {err}")
    })?;
    serde_yaml::from_str(&contents)
        .map(PolicySet::from_rules)
        .map_err(|err| {
            warn!(event = "policy_parse_failed", path, error = %err);
            format!("policy parse failed: {err}")
        })
}
