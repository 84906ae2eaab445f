use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use catalog_assistant::assistant::AssistantProfile;
use catalog_assistant::cache::{KeyValueCache, MemoryCache};
use catalog_assistant::client::OpenAIClient;
use catalog_assistant::poller::RunPoller;
use catalog_assistant::provision::{CacheKeys, Provisioner};
use catalog_assistant::session::{self, SAMPLE_QUESTION};
use catalog_assistant::{AppContext, AppError};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/ecommerce.txt")
}

fn run_body(status: &str) -> serde_json::Value {
    json!({
        "id": "run_1",
        "object": "thread.run",
        "thread_id": "thread_1",
        "assistant_id": "asst_1",
        "status": status
    })
}

async fn mount_provisioning(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file-1" })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/assistants"))
        .and(body_partial_json(json!({
            "tool_resources": { "file_search": { "vector_stores": [{ "file_ids": ["file-1"] }] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "asst_1" })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_1" })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_question_flow(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/messages"))
        .and(body_partial_json(json!({ "role": "user", "content": SAMPLE_QUESTION })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_user",
            "role": "user",
            "content": [{ "type": "text", "text": { "value": SAMPLE_QUESTION, "annotations": [] } }]
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("queued")))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("in_progress")))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_body("completed")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                {
                    "id": "msg_answer",
                    "role": "assistant",
                    "run_id": "run_1",
                    "content": [{
                        "type": "text",
                        "text": {
                            "value": "We have Puma, Nike, Fabindia, Levis and Adidas.",
                            "annotations": []
                        }
                    }]
                },
                {
                    "id": "msg_user",
                    "role": "user",
                    "content": [{ "type": "text", "text": { "value": SAMPLE_QUESTION, "annotations": [] } }]
                }
            ],
            "has_more": false
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn empty_cache_to_answer() {
    let server = MockServer::start().await;
    mount_provisioning(&server).await;
    mount_question_flow(&server).await;

    let cache = Arc::new(MemoryCache::new());
    let api = Arc::new(OpenAIClient::new("test_key".to_string()).with_base_url(server.uri()));
    let ctx = AppContext::new(cache.clone(), api);
    let keys = CacheKeys::default();

    let provisioned = Provisioner::new(&ctx, &keys)
        .provision(&catalog_path(), &AssistantProfile::default(), None)
        .await
        .unwrap();
    assert_eq!(provisioned.file_id, "file-1");
    assert_eq!(provisioned.assistant_id, "asst_1");
    assert_eq!(provisioned.thread_id, "thread_1");

    let answer = session::ask(
        &ctx,
        &provisioned,
        SAMPLE_QUESTION,
        &RunPoller::new(Duration::from_millis(10)),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(answer.message_id, "msg_answer");
    assert_eq!(
        answer.render(),
        "We have Puma, Nike, Fabindia, Levis and Adidas."
    );

    let run_fetches = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == "/threads/thread_1/runs/run_1")
        .count();
    assert_eq!(run_fetches, 2);

    assert_eq!(
        cache.get("assistantDemo:userSessionThreadId").await.unwrap().as_deref(),
        Some("thread_1")
    );
}

#[tokio::test]
async fn warm_cache_skips_all_creation_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/assistants"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryCache::with_entries([
        ("assistantDemo:dataFileId", "file-1"),
        ("assistantDemo:assistantId", "asst_1"),
        ("assistantDemo:userSessionThreadId", "thread_1"),
    ]));
    let api = Arc::new(OpenAIClient::new("test_key".to_string()).with_base_url(server.uri()));
    let ctx = AppContext::new(cache, api);
    let keys = CacheKeys::default();

    let provisioned = Provisioner::new(&ctx, &keys)
        .provision(&catalog_path(), &AssistantProfile::default(), None)
        .await
        .unwrap();

    assert_eq!(provisioned.thread_id, "thread_1");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_assistant_creation_propagates_and_keeps_file_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file-1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/assistants"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "You exceeded your current quota" }
        })))
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryCache::new());
    let api = Arc::new(OpenAIClient::new("test_key".to_string()).with_base_url(server.uri()));
    let ctx = AppContext::new(cache.clone(), api);
    let keys = CacheKeys::default();

    let err = Provisioner::new(&ctx, &keys)
        .provision(&catalog_path(), &AssistantProfile::default(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Remote(_)));
    assert!(err.to_string().contains("quota"));
    assert_eq!(
        cache.get(&keys.data_file_id()).await.unwrap().as_deref(),
        Some("file-1")
    );
    assert_eq!(cache.get(&keys.assistant_id()).await.unwrap(), None);
}
