use thiserror::Error;

/// Errors surfaced by the public viewer API.
///
/// Inside a running session nothing fails: missing input, unknown categories
/// and unsized containers degrade the scene instead. These variants only
/// cover parsing inputs and acquiring a rendering context.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("model could not be parsed: {0}")]
    InvalidModel(#[from] serde_json::Error),

    #[error("viewer configuration could not be parsed: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    #[error("no rendering context available: {0}")]
    RendererUnavailable(String),
}
