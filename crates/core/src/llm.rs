//! Seam for the external language model service.

use crate::error::LlmError;

/// A synchronous text-generation service.
///
/// One call is made per slide pair; implementations decide their own
/// timeout, which is the only bound on a call.
pub trait LlmClient {
    /// Submit a prompt and return the model's free-form answer.
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

impl<T: LlmClient + ?Sized> LlmClient for &T {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).generate(prompt)
    }
}

impl<T: LlmClient + ?Sized> LlmClient for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).generate(prompt)
    }
}
