//! Offline language model for lessons run without provider credentials

use crate::error::{LlmError, LlmResult};
use crate::lm_provider::{LanguageModel, LmRequest};
use crate::response::{Choice, FinishReason, LmResponse, Usage};
use crate::rules::{default_rules, Responder, ResponseRule};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

const MODEL_NAME: &str = "mock";

/// One `generate` call as the mock saw it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Matched rule category; `None` when the fallback answered
    pub category: Option<String>,
    pub prompt: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RuleTable {
    #[serde(default)]
    rules: Vec<ResponseRule>,
    fallback: Option<Responder>,
}

/// Deterministic keyword-driven model.
///
/// The effective prompt is lowercased and checked against each rule in
/// order. The first matching rule answers; if none match, the fallback does.
#[derive(Debug)]
pub struct MockLm {
    rules: Vec<ResponseRule>,
    fallback: Responder,
    calls: RwLock<Vec<CallRecord>>,
}

impl MockLm {
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Replace the built-in table. Order is significant.
    pub fn with_rules(rules: Vec<ResponseRule>) -> Self {
        Self {
            rules,
            fallback: Responder::Echo,
            calls: RwLock::new(Vec::new()),
        }
    }

    pub fn with_fallback(mut self, fallback: Responder) -> Self {
        self.fallback = fallback;
        self
    }

    /// Build from a TOML table of `[[rules]]` plus an optional `fallback`.
    ///
    /// An empty `rules` list keeps the built-in table.
    pub fn from_toml_str(content: &str) -> LlmResult<Self> {
        let table: RuleTable =
            toml::from_str(content).map_err(|e| LlmError::Config(e.to_string()))?;
        let rules = if table.rules.is_empty() {
            default_rules()
        } else {
            table.rules
        };
        let mock = Self::with_rules(rules);
        Ok(match table.fallback {
            Some(fallback) => mock.with_fallback(fallback),
            None => mock,
        })
    }

    pub fn rules(&self) -> &[ResponseRule] {
        &self.rules
    }

    /// Category the prompt would match, without recording a call
    pub fn classify(&self, prompt: &str) -> Option<&str> {
        self.matching_rule(&prompt.to_lowercase())
            .map(|rule| rule.category.as_str())
    }

    /// Every call so far, oldest first
    pub async fn history(&self) -> Vec<CallRecord> {
        self.calls.read().await.clone()
    }

    fn matching_rule(&self, lowered: &str) -> Option<&ResponseRule> {
        self.rules.iter().find(|rule| rule.matcher.matches(lowered))
    }
}

impl Default for MockLm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLm {
    async fn generate(&self, request: LmRequest) -> LlmResult<LmResponse> {
        let prompt = request.effective_prompt()?;
        let rule = self.matching_rule(&prompt.to_lowercase());
        let (category, text) = match rule {
            Some(rule) => (Some(rule.category.clone()), rule.responder.respond(&prompt)),
            None => (None, self.fallback.respond(&prompt)),
        };

        tracing::debug!(
            model = MODEL_NAME,
            category = category.as_deref().unwrap_or("fallback"),
            prompt_len = prompt.len(),
            "Mock generation"
        );

        let usage = Usage::estimate(&prompt, &text);
        let response = LmResponse::new(
            MODEL_NAME,
            vec![Choice::new(text.clone(), FinishReason::Stop)],
            usage,
        );

        self.calls.write().await.push(CallRecord {
            category,
            prompt,
            response: text,
            timestamp: Utc::now(),
        });

        Ok(response)
    }

    fn name(&self) -> &str {
        MODEL_NAME
    }
}
