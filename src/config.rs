use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3600,http://localhost:5173";

/// Runtime configuration for the document processing service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Tesseract executable name or path.
    pub tesseract_cmd: String,
    /// Language pack passed to Tesseract with `-l`.
    pub ocr_language: String,
    /// Longest image side, in pixels, before OCR downscales the input.
    pub ocr_max_dimension: u32,
    /// Upper bound on a single Tesseract run.
    pub ocr_timeout: Duration,
    /// Explicit LibreOffice `soffice` path; located automatically when unset.
    pub soffice_path: Option<PathBuf>,
    /// Upper bound on a single office-to-PDF conversion.
    pub conversion_timeout: Duration,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
    /// Origins allowed by the CORS layer.
    pub cors_allowed_origins: Vec<String>,
    /// Directory that receives per-request image extraction folders.
    pub image_output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: None,
            tesseract_cmd: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            ocr_max_dimension: 3000,
            ocr_timeout: Duration::from_secs(120),
            soffice_path: None,
            conversion_timeout: Duration::from_secs(60),
            max_upload_bytes: 50 * 1024 * 1024,
            cors_allowed_origins: split_origins(DEFAULT_CORS_ORIGINS),
            image_output_dir: PathBuf::from("extracted_images"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            server_port: parse_optional("SERVER_PORT")?,
            tesseract_cmd: load_env_optional("TESSERACT_CMD").unwrap_or(defaults.tesseract_cmd),
            ocr_language: load_env_optional("OCR_LANGUAGE").unwrap_or(defaults.ocr_language),
            ocr_max_dimension: parse_optional("OCR_MAX_DIMENSION")?
                .unwrap_or(defaults.ocr_max_dimension),
            ocr_timeout: parse_optional("OCR_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.ocr_timeout),
            soffice_path: load_env_optional("SOFFICE_PATH").map(PathBuf::from),
            conversion_timeout: parse_optional("CONVERSION_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.conversion_timeout),
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_upload_bytes),
            cors_allowed_origins: load_env_optional("CORS_ALLOWED_ORIGINS")
                .map(|value| split_origins(&value))
                .unwrap_or(defaults.cors_allowed_origins),
            image_output_dir: load_env_optional("IMAGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.image_output_dir),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        server_port = ?config.server_port,
        tesseract = %config.tesseract_cmd,
        ocr_language = %config.ocr_language,
        soffice = ?config.soffice_path,
        max_upload_bytes = config.max_upload_bytes,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
