//! Rephrase core.
//!
//! Turns free text into four stylistic rewrites (professional, casual,
//! polite, social) using whatever [`LlmProvider`] you hand it. This crate
//! owns the parts where things actually go wrong:
//!
//! - [`validate`] checks input before any tokens are spent
//! - [`parse_rephrase_response`] digs a JSON object out of chatty model output
//!   and holds it to the frozen [`ResponseContract`]
//! - [`generate_rephrases`] is the one-shot path
//! - [`generate_rephrases_stream`] runs the four styles one after another and
//!   yields [`StyleDelta`]s; a [`RephraseAccumulator`] turns them into the
//!   final result
//!
//! Providers, the error taxonomy and provider configuration live in the
//! `llm` crate and are re-exported here.
//!
//! ```no_run
//! use rephrase::{build_provider, generate_rephrases, validate, LlmConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = build_provider(&LlmConfig::default())?;
//! let text = validate("  Hey guys, let's huddle about AI. ")?;
//! let result = generate_rephrases(provider.as_ref(), &text).await?;
//! println!("{}", result.polite);
//! # Ok(())
//! # }
//! ```

mod contract;
mod extract;
mod orchestrator;
mod prompt;
mod validate;

pub use crate::contract::{ContractViolation, RephraseResult, ResponseContract};
pub use crate::extract::{ModelOutputError, parse_rephrase_response};
pub use crate::orchestrator::{
    DeltaStream, RephraseAccumulator, RephraseError, StyleDelta, generate_rephrases,
    generate_rephrases_stream,
};
pub use crate::prompt::{build_rephrase_prompt, build_single_style_prompt};
pub use crate::validate::{
    IssueKind, MAX_TEXT_CHARS, ValidationError, ValidationIssue, validate, validate_body,
};

pub use llm::{
    AzureOpenAiProvider, DEFAULT_AZURE_API_VERSION, FakeProvider, LlmConfig, LlmError, LlmMode,
    LlmProvider, NormalizedError, Style, TextStream, build_provider,
};
