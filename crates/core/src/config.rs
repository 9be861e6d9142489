use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DocQaError, Result};

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

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

fn megabytes_to_bytes(mb: usize) -> usize {
    mb.saturating_mul(1024 * 1024)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub document: DocumentConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DOCQA_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DOCQA_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            document: DocumentConfig::from_env_profiled(p),
            retrieval: RetrievalConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Check every cross-field constraint once at startup.
    pub fn validate(&self) -> Result<()> {
        self.document.validate()?;
        self.retrieval.validate(self.document.chunk_size)?;
        self.llm.validate()?;
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  server:     {}:{}, cors={}, error_status_codes={}",
            self.server.host,
            self.server.port,
            self.server.cors_origin,
            self.server.error_status_codes
        );
        tracing::info!(
            "  document:   upload_path={}, startup_pdf={}, chunk_size={}, overlap={}",
            self.document.upload_path.display(),
            self.document
                .startup_pdf
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".into()),
            self.document.chunk_size,
            self.document.chunk_overlap
        );
        tracing::info!(
            "  retrieval:  top_k={}, max_context_words={}",
            self.retrieval.top_k,
            self.retrieval.max_context_words
        );
        tracing::info!(
            "  llm:        provider={}, model={}, mode={}, timeout={}s, key={}",
            self.llm.provider,
            self.llm.gemini_model,
            self.llm.response_mode,
            self.llm.timeout_secs,
            if self.llm.is_configured() { "set" } else { "(missing)" }
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `*` for any origin, otherwise a comma-separated allow-list.
    pub cors_origin: String,
    pub max_upload_bytes: usize,
    /// When false every error is reported at HTTP 200 with an `{"error"}` body.
    pub error_status_codes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            cors_origin: "*".into(),
            max_upload_bytes: 50 * 1024 * 1024,
            error_status_codes: false,
        }
    }
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            host: profiled_env_or(p, "HOST", &d.host),
            port: profiled_env_parse(p, "PORT", d.port),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", &d.cors_origin),
            max_upload_bytes: megabytes_to_bytes(profiled_env_parse(p, "MAX_UPLOAD_MB", 50)),
            error_status_codes: profiled_env_bool(p, "ERROR_STATUS_CODES", d.error_status_codes),
        }
    }

    /// Parsed CORS allow-list; `None` means any origin.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_origin
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }
}

// ── Document ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Fixed path every upload is written to (overwritten each time).
    pub upload_path: PathBuf,
    /// PDF loaded at startup; a missing file is fatal.
    pub startup_pdf: Option<PathBuf>,
    pub upload_enabled: bool,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            upload_path: PathBuf::from("uploaded_pdfs/document.pdf"),
            startup_pdf: None,
            upload_enabled: true,
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl DocumentConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            upload_path: profiled_env_opt(p, "UPLOAD_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.upload_path),
            startup_pdf: profiled_env_opt(p, "STARTUP_PDF_PATH").map(PathBuf::from),
            upload_enabled: profiled_env_bool(p, "UPLOAD_ENABLED", d.upload_enabled),
            chunk_size: profiled_env_parse(p, "CHUNK_SIZE", d.chunk_size),
            chunk_overlap: profiled_env_parse(p, "CHUNK_OVERLAP", d.chunk_overlap),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size <= self.chunk_overlap {
            return Err(DocQaError::Config(format!(
                "CHUNK_SIZE ({}) must be greater than CHUNK_OVERLAP ({})",
                self.chunk_size, self.chunk_overlap
            )));
        }
        if !self.upload_enabled && self.startup_pdf.is_none() {
            return Err(DocQaError::Config(
                "uploads are disabled and no STARTUP_PDF_PATH is set; nothing could ever be loaded"
                    .into(),
            ));
        }
        Ok(())
    }
}

// ── Retrieval ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Upper bound on `top_k * chunk_size`, sized to the model's context window.
    pub max_context_words: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_context_words: 8000,
        }
    }
}

impl RetrievalConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            top_k: profiled_env_parse(p, "TOP_K", d.top_k),
            max_context_words: profiled_env_parse(p, "MAX_CONTEXT_WORDS", d.max_context_words),
        }
    }

    pub fn validate(&self, chunk_size: usize) -> Result<()> {
        if self.top_k == 0 {
            return Err(DocQaError::Config("TOP_K must be at least 1".into()));
        }
        let worst_case = self.top_k.saturating_mul(chunk_size);
        if worst_case > self.max_context_words {
            return Err(DocQaError::Config(format!(
                "TOP_K * CHUNK_SIZE = {} words exceeds MAX_CONTEXT_WORDS ({})",
                worst_case, self.max_context_words
            )));
        }
        Ok(())
    }
}

// ── LLM (Gemini) ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Only "gemini" is supported.
    pub provider: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// "buffered" or "stream".
    pub response_mode: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            gemini_api_key: None,
            gemini_model: "gemma-3n-e4b-it".into(),
            gemini_base_url: "https://generativelanguage.googleapis.com".into(),
            response_mode: "buffered".into(),
            temperature: None,
            max_tokens: None,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", &d.provider).to_lowercase(),
            gemini_api_key: profiled_env_opt(p, "GEMINI_API_KEY"),
            gemini_model: profiled_env_or(p, "GEMINI_MODEL", &d.gemini_model),
            gemini_base_url: profiled_env_or(p, "GEMINI_BASE_URL", &d.gemini_base_url),
            response_mode: profiled_env_or(p, "LLM_RESPONSE_MODE", &d.response_mode).to_lowercase(),
            temperature: profiled_env_opt(p, "LLM_TEMPERATURE").and_then(|v| v.parse().ok()),
            max_tokens: profiled_env_opt(p, "LLM_MAX_TOKENS").and_then(|v| v.parse().ok()),
            timeout_secs: profiled_env_parse(p, "LLM_TIMEOUT_SECS", d.timeout_secs),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "gemini" => self.gemini_api_key.is_some(),
            _ => false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider != "gemini" {
            return Err(DocQaError::Config(format!(
                "unknown LLM provider: '{}'",
                self.provider
            )));
        }
        if !matches!(self.response_mode.as_str(), "buffered" | "stream" | "streamed") {
            return Err(DocQaError::Config(format!(
                "LLM_RESPONSE_MODE must be 'buffered' or 'stream', got '{}'",
                self.response_mode
            )));
        }
        if self.timeout_secs == 0 {
            return Err(DocQaError::Config("LLM_TIMEOUT_SECS must be positive".into()));
        }
        if self.gemini_api_key.is_none() {
            return Err(DocQaError::MissingCredential("GEMINI_API_KEY"));
        }
        Ok(())
    }
}
