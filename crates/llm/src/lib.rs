//! LLM providers for the rephrase service.
//!
//! Everything that talks to (or pretends to talk to) a language model lives
//! here. Callers get one capability, [`LlmProvider`], with two operations:
//! whole-response `complete` and per-style `complete_stream`.
//!
//! Two variants ship:
//!
//! - **Fake** - deterministic canned output, chunked streaming with a
//!   configurable pause. No network, ever. This is the default.
//! - **Azure OpenAI** - real chat-completions calls. Only built when
//!   `LLM_MODE=real` *and* `ALLOW_REAL_LLM` is switched on, so a stray env var
//!   can't burn tokens.
//!
//! Whatever goes wrong upstream comes back as an [`LlmError`], a small fixed
//! taxonomy with HTTP-style status codes and stable machine codes. See
//! [`error`] for the mapping table.
//!
//! ## Quick example
//!
//! ```no_run
//! use llm::{build_provider, LlmConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = build_provider(&LlmConfig::default()).unwrap();
//!     let raw = provider.complete("Rephrase: hello").await.unwrap();
//!     println!("{raw}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod azure;
mod fake;
mod provider;

pub use azure::AzureOpenAiProvider;
pub use config::{LlmConfig, LlmMode, DEFAULT_AZURE_API_VERSION};
pub use error::{translate, LlmError, NormalizedError, UpstreamFailure};
pub use fake::FakeProvider;
pub use provider::{build_provider, LlmProvider, TextStream};
pub use types::Style;
