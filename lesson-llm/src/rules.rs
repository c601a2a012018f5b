//! Ordered keyword rules that pick the mock's output
//!
//! Rules are evaluated in declaration order and the first match wins, so
//! reordering a table can change which category a prompt lands in.

use serde::{Deserialize, Serialize};

const GENERIC_REPLY: &str = "This is a mock response for demonstration purposes.";
const ECHO_WORDS: usize = 20;

/// Predicate over a lowercased prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Matcher {
    /// Prompt contains the keyword
    Keyword(String),
    /// Prompt contains at least one of the keywords
    AnyKeyword(Vec<String>),
}

impl Matcher {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self::Keyword(keyword.into().to_lowercase())
    }

    pub fn any_keyword<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyKeyword(
            keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        )
    }

    /// `prompt` must already be lowercased
    pub fn matches(&self, prompt: &str) -> bool {
        match self {
            Self::Keyword(keyword) => contains_keyword(prompt, keyword),
            Self::AnyKeyword(keywords) => keywords.iter().any(|k| contains_keyword(prompt, k)),
        }
    }
}

/// How a matched rule produces text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Responder {
    Fixed(String),
    /// Generic reply quoting the start of the prompt
    Echo,
}

impl Responder {
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::Fixed(text.into())
    }

    pub fn respond(&self, prompt: &str) -> String {
        match self {
            Self::Fixed(text) => text.clone(),
            Self::Echo => echo(prompt),
        }
    }
}

/// One entry of a response table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRule {
    pub category: String,
    pub matcher: Matcher,
    pub responder: Responder,
}

impl ResponseRule {
    pub fn new(category: impl Into<String>, matcher: Matcher, responder: Responder) -> Self {
        Self {
            category: category.into(),
            matcher,
            responder,
        }
    }

    /// Rule whose keyword is its own category name
    pub fn fixed(category: &str, text: &str) -> Self {
        Self::new(category, Matcher::keyword(category), Responder::fixed(text))
    }
}

/// Built-in table: greet, summarize, extract, classify, translate, explain
pub fn default_rules() -> Vec<ResponseRule> {
    vec![
        ResponseRule::fixed("greet", "Hello! It's wonderful to meet you!"),
        ResponseRule::fixed(
            "summarize",
            "This is a concise summary of the provided text.",
        ),
        ResponseRule::fixed("extract", r#"{"key": "value", "found": true}"#),
        ResponseRule::fixed("classify", "positive"),
        ResponseRule::fixed("translate", "Translated text here"),
        ResponseRule::fixed("explain", "This code does X by using Y approach."),
    ]
}

// tables loaded through serde skip the lowercasing constructors
fn contains_keyword(prompt: &str, keyword: &str) -> bool {
    !keyword.is_empty() && prompt.contains(keyword.to_lowercase().as_str())
}

fn echo(prompt: &str) -> String {
    let words: Vec<&str> = prompt.split_whitespace().collect();
    if words.is_empty() {
        return GENERIC_REPLY.to_string();
    }
    let mut quoted = words[..words.len().min(ECHO_WORDS)].join(" ");
    if words.len() > ECHO_WORDS {
        quoted.push_str(" ...");
    }
    format!("{GENERIC_REPLY} You asked: \"{quoted}\"")
}
