/// Scripted generator for tests.
///
/// Returns one fixed reply and remembers every prompt it was given.
use std::sync::Mutex;

use super::{Generator, GeneratorError};

pub struct ScriptedGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        self.prompts
            .lock()
            .map_err(|e| GeneratorError::Config(format!("lock poisoned: {e}")))?
            .push(prompt.to_string());
        Ok(self.reply.clone())
    }
}
