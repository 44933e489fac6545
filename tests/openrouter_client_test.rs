use affiliate_promoter::conversation::{ChatHistory, Message};
use affiliate_promoter::llm::{CodeGenerationBackend, OpenRouterProvider};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn history() -> ChatHistory {
    vec![
        Message::system("You are an influencer."),
        Message::user("Write research code."),
    ]
    .into()
}

#[tokio::test]
async fn test_completion_returns_first_choice() {
    let mock_server = MockServer::start().await;

    let response_json = serde_json::json!({
        "id": "gen-1",
        "choices": [
            {
                "message": {"role": "assistant", "content": "```python\nprint('hi')\n```"},
                "finish_reason": "stop"
            }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "test/model",
            "messages": [
                {"role": "system", "content": "You are an influencer."},
                {"role": "user", "content": "Write research code."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response_json))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenRouterProvider::new("test-key")
        .with_model("test/model")
        .with_base_url(mock_server.uri());

    let (codes, raw) = provider.generate_code(&history()).await.unwrap();
    assert_eq!(codes, vec!["print('hi')"]);
    assert!(raw.starts_with("```python"));
}

#[tokio::test]
async fn test_http_error_is_reported_with_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&mock_server)
        .await;

    let provider = OpenRouterProvider::new("test-key").with_base_url(mock_server.uri());

    let err = provider.completion(&history()).await.unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("429"));
    assert!(msg.contains("rate limited"));
}

#[tokio::test]
async fn test_error_body_with_ok_status_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": {"message": "model not found", "code": 404}
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenRouterProvider::new("test-key").with_base_url(mock_server.uri());

    let err = provider.completion(&history()).await.unwrap_err();
    assert!(err.to_string().contains("model not found"));
}

#[tokio::test]
async fn test_reply_without_code_fails_generate_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "No code today."}}]
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenRouterProvider::new("test-key").with_base_url(mock_server.uri());

    let err = provider.generate_code(&history()).await.unwrap_err();
    assert!(err.to_string().contains("No code block found"));
}
