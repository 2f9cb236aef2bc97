use std::env;
use std::fs;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use shopmind_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", &["SHOPMIND_DATABASE_URL"]),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", &["SHOPMIND_DATABASE_MAX_CONNECTIONS"]),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", &["SHOPMIND_DATABASE_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "llm.api_key",
        &redact_key(config.llm.api_key.as_ref()),
        source("llm.api_key", &["SHOPMIND_LLM_API_KEY", "GEMINI_API_KEY"]),
    ));
    lines.push(render_line(
        "llm.base_url",
        &config.llm.base_url,
        source("llm.base_url", &["SHOPMIND_LLM_BASE_URL"]),
    ));
    lines.push(render_line(
        "llm.model",
        &config.llm.model,
        source("llm.model", &["SHOPMIND_LLM_MODEL", "GEMINI_MODEL"]),
    ));
    lines.push(render_line(
        "llm.temperature",
        &config.llm.temperature.to_string(),
        source("llm.temperature", &["SHOPMIND_LLM_TEMPERATURE"]),
    ));
    lines.push(render_line(
        "llm.max_output_tokens",
        &config.llm.max_output_tokens.to_string(),
        source("llm.max_output_tokens", &["SHOPMIND_LLM_MAX_OUTPUT_TOKENS"]),
    ));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        source("llm.timeout_secs", &["SHOPMIND_LLM_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "chat.history_turns",
        &config.chat.history_turns.to_string(),
        source("chat.history_turns", &["SHOPMIND_CHAT_HISTORY_TURNS"]),
    ));
    lines.push(render_line(
        "chat.prompt_product_limit",
        &config.chat.prompt_product_limit.to_string(),
        source("chat.prompt_product_limit", &["SHOPMIND_CHAT_PROMPT_PRODUCT_LIMIT"]),
    ));
    lines.push(render_line(
        "chat.catalog_product_limit",
        &config.chat.catalog_product_limit.to_string(),
        source("chat.catalog_product_limit", &[]),
    ));
    lines.push(render_line(
        "chat.description_chars",
        &config.chat.description_chars.to_string(),
        source("chat.description_chars", &[]),
    ));
    lines.push(render_line(
        "chat.max_references",
        &config.chat.max_references.to_string(),
        source("chat.max_references", &[]),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", &["SHOPMIND_SERVER_BIND_ADDRESS"]),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", &["SHOPMIND_SERVER_PORT"]),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", &["SHOPMIND_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["SHOPMIND_LOGGING_LEVEL", "SHOPMIND_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["SHOPMIND_LOGGING_FORMAT", "SHOPMIND_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_key(key: Option<&SecretString>) -> String {
    match key.map(|key| key.expose_secret().trim()) {
        None => "<unset>".to_string(),
        Some("") => "<empty>".to_string(),
        Some(_) => "<redacted>".to_string(),
    }
}
