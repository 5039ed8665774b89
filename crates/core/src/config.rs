use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub mcp: McpClientConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `FINDER_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("FINDER_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            database: DatabaseConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            agent: AgentConfig::from_env_profiled(p),
            mcp: McpClientConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  server:    host={}, mcp_port={}, client_port={}, origins={}",
            self.server.host,
            self.server.mcp_port,
            self.server.client_port,
            self.server.frontend_origins.join(","),
        );
        tracing::info!("  database:  url={}", self.database.url);
        tracing::info!(
            "  llm:       model={}, configured={}",
            self.llm.model,
            self.llm.is_configured()
        );
        tracing::info!(
            "  agent:     max_iterations={}, system_prompt={}",
            self.agent.max_iterations,
            self.agent.system_prompt.is_some()
        );
        tracing::info!("  mcp:       transport={}", self.mcp.transport.as_str());
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    /// Port of the tool provider's HTTP binding.
    pub mcp_port: u16,
    /// Port of the agent runner's chat endpoint.
    pub client_port: u16,
    /// Front-end origins allowed by CORS.
    pub frontend_origins: Vec<String>,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            mcp_port: profiled_env_u16(p, "MCP_PORT", 8080),
            client_port: profiled_env_u16(p, "CLIENT_PORT", 8081),
            frontend_origins: split_list(&profiled_env_or(
                p,
                "FRONTEND_ORIGINS",
                "http://localhost:3000",
            )),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ── Database ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://humans.db`.
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "DATABASE_URL", "sqlite://humans.db"),
            max_connections: profiled_env_u32(p, "DB_MAX_CONNECTIONS", 5),
        }
    }
}

// ── LLM (Gemini) ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_key: profiled_env_opt(p, "API_KEY")
                .or_else(|| profiled_env_opt(p, "GEMINI_API_KEY")),
            model: profiled_env_or(p, "GEMINI_MODEL", "gemini-3-flash-preview"),
            base_url: profiled_env_or(
                p,
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            temperature: profiled_env_or(p, "LLM_TEMPERATURE", "0.2")
                .parse()
                .unwrap_or(0.2),
            max_tokens: profiled_env_u32(p, "LLM_MAX_TOKENS", 4096),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// The API key, or a configuration error naming the missing variable.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("API_KEY".to_string()))
    }
}

// ── Agent loop ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model turns allowed per prompt; at least 1.
    pub max_iterations: usize,
    /// Sent as the model's system instruction when set.
    pub system_prompt: Option<String>,
}

impl AgentConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_iterations: profiled_env_u32(p, "AGENT_MAX_ITERATIONS", 10).max(1) as usize,
            system_prompt: profiled_env_opt(p, "AGENT_SYSTEM_PROMPT"),
        }
    }
}

// ── MCP client transport ──────────────────────────────────────

/// Which binding the agent runner uses to reach the tool provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Stdio,
    Http,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "http",
        }
    }
}

impl std::str::FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" | "pipe" => Ok(TransportKind::Stdio),
            "http" => Ok(TransportKind::Http),
            other => Err(ConfigError::Invalid {
                key: "MCP_TRANSPORT".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpClientConfig {
    pub transport: TransportKind,
    pub server_command: String,
    pub server_args: Vec<String>,
    pub server_url: String,
    pub timeout_secs: u64,
}

impl McpClientConfig {
    fn from_env_profiled(p: &str) -> Self {
        let transport = profiled_env_or(p, "MCP_TRANSPORT", "stdio")
            .parse()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to stdio transport");
                TransportKind::Stdio
            });
        Self {
            transport,
            server_command: profiled_env_or(p, "MCP_SERVER_COMMAND", "finder-server"),
            server_args: profiled_env_or(p, "MCP_SERVER_ARGS", "stdio")
                .split_whitespace()
                .map(String::from)
                .collect(),
            server_url: profiled_env_or(p, "MCP_SERVER_URL", "http://localhost:8080/mcp"),
            timeout_secs: profiled_env_u32(p, "MCP_TIMEOUT_SECS", 30) as u64,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
