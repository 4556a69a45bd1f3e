use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

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

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Defaults ──────────────────────────────────────────────────

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_INPUT_CHARS: usize = 5_000;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_MAX_PDF_PAGES: usize = 50;

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub summarizer: SummarizerConfig,
    pub limits: LimitsConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RINGKAS_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("RINGKAS_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            summarizer: SummarizerConfig::from_env_profiled(p),
            limits: LimitsConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  server:      {}:{}, cors={}",
            self.server.host,
            self.server.port,
            self.server.cors_origins.join(",")
        );
        tracing::info!(
            "  summarizer:  url={}, model={}, key={}",
            self.summarizer.api_url,
            self.summarizer.model,
            if self.summarizer.is_configured() { "set" } else { "(none)" }
        );
        tracing::info!(
            "  limits:      upload={}B, pdf_pages={}, input_chars={}",
            self.limits.max_upload_bytes,
            self.limits.max_pdf_pages,
            self.summarizer.max_input_chars
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `["*"]` allows any origin.
    pub cors_origins: Vec<String>,
    /// Static page served at `GET /`.
    pub index_html: PathBuf,
    /// Transport-level body limit. Kept above `max_upload_bytes` so oversized
    /// files reach the handler and get a proper rejection message.
    pub max_request_bytes: usize,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 8000),
            cors_origins: parse_origins(&profiled_env_or(p, "CORS_ORIGINS", "*")),
            index_html: PathBuf::from(profiled_env_or(
                p,
                "INDEX_HTML",
                "static/text-summarize.html",
            )),
            max_request_bytes: profiled_env_parse(p, "MAX_REQUEST_BYTES", 20 * 1024 * 1024),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

// ── Summarizer (upstream chat completion API) ─────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Full chat-completions endpoint URL.
    pub api_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Input is cut to this many characters before it is sent upstream.
    pub max_input_chars: usize,
}

impl SummarizerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_url: profiled_env_or(p, "SUMMARIZER_API_URL", DEFAULT_API_URL),
            api_key: profiled_env_opt(p, "OPENROUTER_API_KEY"),
            model: profiled_env_or(p, "SUMMARIZER_MODEL", DEFAULT_MODEL),
            temperature: profiled_env_parse(p, "SUMMARIZER_TEMPERATURE", DEFAULT_TEMPERATURE),
            max_tokens: profiled_env_parse(p, "SUMMARIZER_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            timeout_secs: profiled_env_parse(p, "SUMMARIZER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            max_input_chars: profiled_env_parse(
                p,
                "SUMMARIZER_MAX_INPUT_CHARS",
                DEFAULT_MAX_INPUT_CHARS,
            ),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

// ── Request limits ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_upload_bytes: usize,
    pub max_pdf_pages: usize,
}

impl LimitsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_upload_bytes: profiled_env_parse(p, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            max_pdf_pages: profiled_env_parse(p, "MAX_PDF_PAGES", DEFAULT_MAX_PDF_PAGES),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_pdf_pages: DEFAULT_MAX_PDF_PAGES,
        }
    }
}
