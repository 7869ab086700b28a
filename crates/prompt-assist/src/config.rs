use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_SECRET_KEY: &str = "your-secret-key-change-this";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub generate_timeout_seconds: u64,
    pub secret_key: String,
    pub api_host: String,
    pub api_port: u16,
    pub upload_folder: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_content_length: usize,
    pub memory_file: PathBuf,
    pub conversation_file: PathBuf,
    pub request_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("Failed to load .env file: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY environment variable not set. Please set it in your .env file")?;
        if gemini_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("GEMINI_API_KEY is empty"));
        }

        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET_KEY.into());
        if secret_key == DEFAULT_SECRET_KEY {
            warn!("SECRET_KEY is not set; session cookies are signed with the default key");
        }

        Ok(Self {
            gemini_api_key,
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            generate_timeout_seconds: parse_var("GENERATE_TIMEOUT_SECONDS", "120")?,
            secret_key,
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            api_port: parse_var("API_PORT", "5000")?,
            upload_folder: env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "uploads".into()).into(),
            allowed_extensions: vec!["csv".to_string()],
            max_content_length: parse_var("MAX_CONTENT_LENGTH", "16777216")?,
            memory_file: env::var("MEMORY_FILE").unwrap_or_else(|_| "app_memory.bin".into()).into(),
            conversation_file: env::var("CONVERSATION_FILE")
                .unwrap_or_else(|_| "conversations.bin".into())
                .into(),
            request_timeout_seconds: parse_var("REQUEST_TIMEOUT_SECONDS", "300")?,
        })
    }

    pub fn print_config(&self) {
        info!("Current Configuration:");
        info!("- Gemini Model: {}", self.gemini_model);
        info!("- Gemini Base URL: {}", self.gemini_base_url);
        info!("- Gemini API Key: {}", redact(&self.gemini_api_key));
        info!("- Generate Timeout: {}s", self.generate_timeout_seconds);
        info!("- API: {}:{}", self.api_host, self.api_port);
        info!("- Upload Folder: {}", self.upload_folder.display());
        info!("- Max Content Length: {} bytes", self.max_content_length);
        info!("- Memory File: {}", self.memory_file.display());
        info!("- Conversation File: {}", self.conversation_file.display());
        info!("- Request Timeout: {}s", self.request_timeout_seconds);
    }

    pub fn api_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.api_host, self.api_port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.api_host, self.api_port))
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env::var(name).unwrap_or_else(|_| default.into());
    raw.trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: {:?}", name, raw))
}

/// Keeps the last four characters, enough to tell keys apart in logs.
fn redact(secret: &str) -> String {
    let visible: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{}", visible)
    }
}
