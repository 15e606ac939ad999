use thiserror::Error;

#[derive(Debug, Error)]
pub enum YtError {
    #[error("API key not found. Set OPENAI_API_KEY or configure ~/.config/yotei/config.toml")]
    ApiKeyNotFound,

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pipeline(#[from] yotei_core::PipelineError),

    #[error(transparent)]
    LegacyFormat(#[from] yotei_core::LegacyFormatError),
}
