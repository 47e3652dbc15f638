//! Question answering: retrieve → assemble prompt → generate.
use thiserror::Error;
use tracing::{debug, info};

use crate::generator::{Generator, GeneratorError};
use crate::index::{IndexError, RetrievedMatch, VectorIndex};
use crate::prompt::{assemble_prompt, format_context};

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] IndexError),

    #[error("generation failed: {0}")]
    Generation(#[from] GeneratorError),
}

/// Retrieved matches and the prompt built from them.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub matches: Vec<RetrievedMatch>,
    pub prompt: String,
}

/// Retrieve up to `top_k` matches for `question` and build its prompt.
pub fn prepare_query(
    index: &dyn VectorIndex,
    question: &str,
    top_k: usize,
) -> Result<PreparedQuery, AnswerError> {
    let matches = index.retrieve(question, top_k)?;
    debug!(top_k, retrieved = matches.len(), "retrieved context");

    let prompt = assemble_prompt(question, &format_context(&matches));
    Ok(PreparedQuery { matches, prompt })
}

/// Answers one question at a time. Holds no per-question state.
pub struct Answerer<'a> {
    index: &'a dyn VectorIndex,
    generator: &'a dyn Generator,
    top_k: usize,
}

impl<'a> Answerer<'a> {
    pub fn new(index: &'a dyn VectorIndex, generator: &'a dyn Generator, top_k: usize) -> Self {
        Self {
            index,
            generator,
            top_k,
        }
    }

    /// Retrieve context and build the prompt without calling the generator.
    pub fn prepare(&self, question: &str) -> Result<PreparedQuery, AnswerError> {
        prepare_query(self.index, question, self.top_k)
    }

    /// Answer `question` with the generator's raw output.
    ///
    /// An empty retrieval result is not special-cased: the prompt goes out
    /// with an empty context section.
    pub fn answer(&self, question: &str) -> Result<String, AnswerError> {
        let prepared = self.prepare(question)?;
        let answer = self.generator.generate(&prepared.prompt)?;
        info!(
            retrieved = prepared.matches.len(),
            answer_len = answer.len(),
            "answered question"
        );
        Ok(answer)
    }
}
