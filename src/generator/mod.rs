/// Text generation behind a narrow trait.
pub mod mock;
pub mod openai;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("response contained no message content")]
    EmptyResponse,

    #[error("invalid generator settings: {0}")]
    Config(String),
}

/// Turns a finished prompt into answer text.
///
/// Model identity and sampling settings belong to the implementation, not
/// to the call.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}
