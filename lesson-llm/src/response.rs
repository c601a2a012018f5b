//! Response shape every [`LanguageModel`](crate::LanguageModel) returns
//!
//! Consumers read generated text either by name (`choices()[0].text()`) or by
//! position (`choices()[0][0]`). Both paths read the same field.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
}

/// One generated alternative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    text: String,
    finish_reason: FinishReason,
}

impl Choice {
    pub fn new(text: impl Into<String>, finish_reason: FinishReason) -> Self {
        Self {
            text: text.into(),
            finish_reason,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn finish_reason(&self) -> FinishReason {
        self.finish_reason
    }

    /// Positional access; index 0 is the text
    pub fn get(&self, index: usize) -> Option<&str> {
        (index == 0).then_some(self.text.as_str())
    }
}

impl Index<usize> for Choice {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        match self.get(index) {
            Some(text) => text,
            None => panic!("choice index out of range: {index} (only 0 is valid)"),
        }
    }
}

/// Ordered choices; indexing and iteration see the same sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Choices(Vec<Choice>);

impl Choices {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Choice> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&Choice> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Choice> {
        self.0.iter()
    }
}

impl From<Vec<Choice>> for Choices {
    fn from(choices: Vec<Choice>) -> Self {
        Self(choices)
    }
}

impl Index<usize> for Choices {
    type Output = Choice;

    fn index(&self, index: usize) -> &Choice {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Choices {
    type Item = &'a Choice;
    type IntoIter = std::slice::Iter<'a, Choice>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Choices {
    type Item = Choice;
    type IntoIter = std::vec::IntoIter<Choice>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Token accounting for one call; `total_tokens` is always the sum of the other two
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

impl Usage {
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Usage estimated by counting whitespace-separated words.
    ///
    /// This is not a tokenizer; real providers report different numbers.
    pub fn estimate(prompt: &str, completion: &str) -> Self {
        Self::new(count_words(prompt), count_words(completion))
    }

    pub fn prompt_tokens(&self) -> usize {
        self.prompt_tokens
    }

    pub fn completion_tokens(&self) -> usize {
        self.completion_tokens
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// A completed generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LmResponse {
    model: String,
    choices: Choices,
    usage: Usage,
}

impl LmResponse {
    pub fn new(model: impl Into<String>, choices: impl Into<Choices>, usage: Usage) -> Self {
        Self {
            model: model.into(),
            choices: choices.into(),
            usage,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn choices(&self) -> &Choices {
        &self.choices
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    /// Text of the first choice, if any
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(Choice::text)
    }
}
