use polyglot_forge::load_config::ProviderSection;
use polyglot_forge::provider::FireworksClient;
use polyglot_forge_core::contract::{GenerationError, GenerationRequest, Generator};
use serde_json::{json, Value};
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> FireworksClient {
    let section = ProviderSection {
        api_key: Some("test-key".into()),
        base_url: server.uri(),
        retry_initial_delay_ms: 1,
        ..ProviderSection::default()
    };
    FireworksClient::from_config(&section).expect("client builds")
}

fn request(max_retries: u32) -> GenerationRequest {
    GenerationRequest {
        prompt: "Convert the following file to Python.".into(),
        schema: json!({ "type": "object" }),
        model: "test-model".into(),
        max_retries,
    }
}

fn completion(content: &str) -> Value {
    json!({
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

#[tokio::test]
async fn sends_schema_and_returns_parsed_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("test-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "response_format": { "type": "json_object", "schema": { "type": "object" } }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(r#"{"path":"a.py","content":"print(1)"}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let value = client_for(&server).generate(request(2)).await.unwrap();
    assert_eq!(value, json!({ "path": "a.py", "content": "print(1)" }));
}

#[tokio::test]
async fn fenced_output_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "```json\n{\"path\":\"b.go\",\"content\":\"package b\"}\n```",
        )))
        .mount(&server)
        .await;

    let value = client_for(&server).generate(request(0)).await.unwrap();
    assert_eq!(value["path"], "b.go");
}

#[tokio::test]
async fn retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(r#"{"path":"a.py","content":"ok"}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let value = client_for(&server).generate(request(2)).await.unwrap();
    assert_eq!(value["content"], "ok");
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request(2)).await.unwrap_err();
    assert!(
        matches!(err, GenerationError::Unauthorized { status: 401, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request(2)).await.unwrap_err();
    match err {
        GenerationError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, GenerationError::RateLimited(_)));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn prose_output_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Here you go!")))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request(2)).await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidOutput(_)), "got {err:?}");
}

#[test]
fn missing_api_key_is_an_error() {
    let err = FireworksClient::from_config(&ProviderSection::default())
        .err()
        .expect("client must not build without a key");
    assert!(err.to_string().contains("FIREWORKS_API_KEY"));
}
