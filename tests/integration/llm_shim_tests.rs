//! Integration tests for the mock language model as lesson code sees it
//!
//! Everything here goes through `Arc<dyn LanguageModel>`, the way a lesson
//! that does not know which provider it got would call it.

use assert_matches::assert_matches;
use lesson_llm::{
    ChatMessage, LanguageModel, LlmError, LmRequest, Matcher, MockLm, Responder, ResponseRule,
};
use serde_json::Value;
use std::sync::Arc;

fn model() -> (Arc<MockLm>, Arc<dyn LanguageModel>) {
    let mock = Arc::new(MockLm::new());
    let model: Arc<dyn LanguageModel> = mock.clone();
    (mock, model)
}

#[tokio::test]
async fn test_text_by_name_and_position() -> anyhow::Result<()> {
    let (mock, model) = model();

    let response = model
        .generate(LmRequest::prompt("please summarize this"))
        .await?;

    let choices = response.choices();
    assert_eq!(choices.len(), 1);
    assert_eq!(choices[0].text(), &choices[0][0]);
    assert_eq!(
        choices[0].text(),
        "This is a concise summary of the provided text."
    );
    assert_eq!(
        mock.history().await[0].category.as_deref(),
        Some("summarize")
    );
    Ok(())
}

#[tokio::test]
async fn test_message_input_matches_prompt_input() -> anyhow::Result<()> {
    let (_, model) = model();

    let via_messages = model
        .generate(LmRequest::messages(vec![ChatMessage::user("translate hello")]))
        .await?;
    let via_prompt = model.generate(LmRequest::prompt("translate hello")).await?;

    assert_eq!(via_messages, via_prompt);
    Ok(())
}

#[tokio::test]
async fn test_conversation_is_flattened_before_matching() -> anyhow::Result<()> {
    let (mock, model) = model();

    model
        .generate(LmRequest::messages(vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("Please classify the sentiment of this review."),
        ]))
        .await?;

    let call = &mock.history().await[0];
    assert_eq!(call.category.as_deref(), Some("classify"));
    assert_eq!(call.response, "positive");
    assert_eq!(
        call.prompt,
        "You are a helpful assistant.\nPlease classify the sentiment of this review."
    );
    Ok(())
}

#[tokio::test]
async fn test_completion_tokens_match_generated_words() -> anyhow::Result<()> {
    let (_, model) = model();

    for prompt in [
        "greet Alice",
        "summarize the article",
        "extract the fields",
        "explain this function",
        "something unmatched entirely",
    ] {
        let response = model.generate(LmRequest::prompt(prompt)).await?;
        let usage = response.usage();
        let text = response.text().unwrap_or_default();

        assert_eq!(usage.completion_tokens(), text.split_whitespace().count());
        assert_eq!(usage.prompt_tokens(), prompt.split_whitespace().count());
        assert_eq!(
            usage.total_tokens(),
            usage.prompt_tokens() + usage.completion_tokens()
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_iteration_sees_what_indexing_sees() -> anyhow::Result<()> {
    let (_, model) = model();
    let response = model.generate(LmRequest::prompt("greet Bob")).await?;

    let choices = response.choices();
    let iterated: Vec<&str> = choices.iter().map(|c| c.text()).collect();
    let indexed: Vec<&str> = (0..choices.len()).map(|i| &choices[i][0]).collect();
    assert_eq!(iterated, indexed);
    Ok(())
}

#[tokio::test]
async fn test_response_serializes_like_a_completion() -> anyhow::Result<()> {
    let (_, model) = model();
    let response = model.generate(LmRequest::prompt("extract names")).await?;

    let value = serde_json::to_value(&response)?;
    assert_eq!(value["model"], "mock");
    assert_eq!(value["choices"][0]["finish_reason"], "stop");
    assert!(value["usage"]["total_tokens"].is_u64());

    let extracted: Value = serde_json::from_str(value["choices"][0]["text"].as_str().unwrap_or("{}"))?;
    assert_eq!(extracted["key"], "value");
    Ok(())
}

#[tokio::test]
async fn test_empty_request_is_rejected() {
    let (mock, model) = model();

    assert_matches!(
        model.generate(LmRequest::default()).await,
        Err(LlmError::InvalidInput(_))
    );
    assert_matches!(
        model.generate(LmRequest::messages(vec![ChatMessage::user("  ")])).await,
        Err(LlmError::InvalidInput(_))
    );
    assert!(mock.history().await.is_empty());
}

#[tokio::test]
async fn test_custom_table_replaces_defaults() -> anyhow::Result<()> {
    let mock = MockLm::with_rules(vec![ResponseRule::new(
        "weather",
        Matcher::any_keyword(["rain", "forecast"]),
        Responder::fixed("Sunny all week."),
    )])
    .with_fallback(Responder::fixed("I only know the weather."));
    let model: Arc<dyn LanguageModel> = Arc::new(mock);

    let forecast = model.generate(LmRequest::prompt("Forecast for Monday?")).await?;
    let other = model.generate(LmRequest::prompt("please summarize this")).await?;

    assert_eq!(forecast.text(), Some("Sunny all week."));
    assert_eq!(other.text(), Some("I only know the weather."));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_calls_are_all_recorded() -> anyhow::Result<()> {
    let (mock, model) = model();

    let mut handles = Vec::new();
    for i in 0..16 {
        let model = model.clone();
        handles.push(tokio::spawn(async move {
            model
                .generate(LmRequest::prompt(format!("classify item {i}")))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let history = mock.history().await;
    assert_eq!(history.len(), 16);
    let mut prompts: Vec<&str> = history.iter().map(|c| c.prompt.as_str()).collect();
    prompts.sort_unstable();
    prompts.dedup();
    assert_eq!(prompts.len(), 16);
    Ok(())
}
