//! Language-model interface for lesson scripts
//!
//! Lessons talk to a [`LanguageModel`]. When no provider is configured they
//! get a [`MockLm`], which answers from an ordered keyword table and returns
//! responses with the same shape a completion client would.
//!
//! ```ignore
//! let lm: Arc<dyn LanguageModel> = Arc::new(MockLm::new());
//! let response = lm.generate(LmRequest::prompt("please summarize this")).await?;
//! assert_eq!(response.choices()[0].text(), &response.choices()[0][0]);
//! ```

pub mod error;
pub mod lm_provider;
pub mod mock;
pub mod response;
pub mod rules;

pub use error::{LlmError, LlmResult};
pub use lm_provider::{ChatMessage, LanguageModel, LmRequest, Role};
pub use mock::{CallRecord, MockLm};
pub use response::{count_words, Choice, Choices, FinishReason, LmResponse, Usage};
pub use rules::{default_rules, Matcher, Responder, ResponseRule};
