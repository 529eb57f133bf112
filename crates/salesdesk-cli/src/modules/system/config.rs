use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{CliConfig, CliContext};
use crate::cli_args::{ConfigArgs, ConfigCommand};
use crate::{DEFAULT_ADDR, DEFAULT_TIMEOUT_SECONDS};

/// Where and how to reach the server for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub addr: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

pub(crate) fn handle_config_command(
    args: ConfigArgs,
    config: &mut CliConfig,
) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::SetContext(args) => {
            let entry = config
                .contexts
                .entry(args.name.clone())
                .or_insert_with(|| CliContext {
                    addr: DEFAULT_ADDR.to_string(),
                    token: None,
                    timeout_seconds: None,
                });
            if let Some(addr) = args.addr {
                entry.addr = addr;
            }
            if let Some(token) = args.token {
                entry.token = Some(token);
            }
            if let Some(timeout) = args.timeout_seconds {
                if timeout == 0 {
                    anyhow::bail!("timeout must be at least one second");
                }
                entry.timeout_seconds = Some(timeout);
            }
            config.current_context = Some(args.name);
        }
        ConfigCommand::UseContext(args) => {
            if !config.contexts.contains_key(&args.name) {
                anyhow::bail!("context not found: {}", args.name);
            }
            config.current_context = Some(args.name);
        }
        ConfigCommand::CurrentContext => {
            if let Some(current) = config.current_context.clone() {
                println!("{current}");
            }
        }
        ConfigCommand::GetContexts => {
            let mut names: Vec<_> = config.contexts.keys().cloned().collect();
            names.sort();
            for name in names {
                let marker = if config.current_context.as_ref() == Some(&name) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {name}");
            }
        }
        ConfigCommand::RemoveContext(args) => {
            if config.contexts.remove(&args.name).is_none() {
                anyhow::bail!("context not found: {}", args.name);
            }
            if config.current_context.as_deref() == Some(args.name.as_str()) {
                config.current_context = None;
            }
        }
    }
    Ok(())
}

fn config_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("HOME is not set"))?;
    Ok(Path::new(&home).join(".salesdesk").join("config.json"))
}

pub(crate) fn load_config() -> anyhow::Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let config = serde_json::from_str(&contents)?;
    Ok(config)
}

pub(crate) fn save_config(config: &CliConfig) -> anyhow::Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Flags win over the selected context, which wins over built-in defaults.
pub(crate) fn resolve_target(
    addr_arg: Option<String>,
    token_arg: Option<String>,
    timeout_arg: Option<u64>,
    context_arg: Option<String>,
    config: &CliConfig,
) -> anyhow::Result<Target> {
    let context_name = context_arg.or_else(|| config.current_context.clone());
    let context = match context_name {
        Some(name) => Some(
            config
                .contexts
                .get(&name)
                .ok_or_else(|| anyhow::anyhow!("context not found: {}", name))?,
        ),
        None => None,
    };

    let addr = addr_arg
        .or_else(|| context.map(|ctx| ctx.addr.clone()))
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let token = token_arg.or_else(|| context.and_then(|ctx| ctx.token.clone()));
    let seconds = timeout_arg
        .or_else(|| context.and_then(|ctx| ctx.timeout_seconds))
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
        .max(1);

    Ok(Target {
        addr,
        token,
        timeout: Duration::from_secs(seconds),
    })
}

pub(crate) fn ensure_secure_addr(addr: &str, allow_insecure: bool) -> anyhow::Result<()> {
    if addr.starts_with("http://") && !allow_insecure {
        anyhow::bail!("refusing to use http:// without --insecure");
    }
    Ok(())
}
