//! The `Generator` trait -- the seam to the external generation service.
//!
//! The coordinator only ever talks to `dyn Generator`, so tests can script
//! replies and the binary can plug in [`GeminiGenerator`].

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;

use crate::prompt::Prompt;
use crate::schema::Schema;

pub use gemini::GeminiGenerator;

/// Produces raw structured text for a prompt and its output schema.
///
/// Called exactly once per generation; retries, timeouts and decoding are
/// the caller's concern. An `Ok` with empty text is reported upstream as an
/// empty response.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable name used in log fields (e.g. "gemini").
    fn name(&self) -> &str;

    /// Run one generation and return the model's text payload.
    async fn generate(&self, prompt: &Prompt, schema: &Schema) -> Result<String>;
}

// Compile-time assertion: Generator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Generator) {}
};
