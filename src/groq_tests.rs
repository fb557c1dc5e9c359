//! Tests for the Groq recipe client.

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{metadata_prompt, suggestion_prompt, RecipeClient};

fn client_with_mock(mock_uri: &str) -> RecipeClient {
    RecipeClient::new(Some("test-key".to_string()), "llama-test").with_base_url(mock_uri)
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [ { "message": { "role": "assistant", "content": content } } ]
    })
}

fn ingredients(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn prompts_list_ingredients_and_count() {
    let prompt = suggestion_prompt(&ingredients(&["eggs", "milk"]), 5);
    assert!(prompt.contains("eggs, milk"));
    assert!(prompt.contains("Suggest 5 simple recipes"));

    let prompt = metadata_prompt("Omelette", &ingredients(&["eggs"]));
    assert!(prompt.contains("Recipe: Omelette"));
    assert!(prompt.contains("\"difficulty\""));
}

// ── suggest_recipes ──────────────────────────────────────────────────

#[tokio::test]
async fn suggest_recipes_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({ "model": "llama-test" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"[{"name": "Omelette", "ingredients": ["eggs", "milk"], "how_to_cook": "Whisk and fry."}]"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    let recipes = client
        .suggest_recipes(&ingredients(&["eggs", "milk"]), None)
        .await;

    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0].name, "Omelette");
    assert_eq!(recipes[0].ingredients, vec!["eggs", "milk"]);
    assert_eq!(recipes[0].how_to_cook.as_deref(), Some("Whisk and fry."));
}

#[tokio::test]
async fn default_count_is_three() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("[]")))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    client.suggest_recipes(&ingredients(&["rice"]), None).await;
    client.suggest_recipes(&ingredients(&["rice"]), Some(6)).await;

    let requests = mock_server.received_requests().await.unwrap();
    let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let second: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert!(first["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("Suggest 3 simple recipes"));
    assert!(second["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("Suggest 6 simple recipes"));
}

#[tokio::test]
async fn empty_ingredients_short_circuit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("[]")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    assert!(client.suggest_recipes(&[], Some(3)).await.is_empty());
}

#[tokio::test]
async fn failures_degrade_to_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    assert!(client
        .suggest_recipes(&ingredients(&["eggs"]), None)
        .await
        .is_empty());
}

#[tokio::test]
async fn unparseable_content_degrades_to_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Sure! Here you go")))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    assert!(client
        .suggest_recipes(&ingredients(&["eggs"]), None)
        .await
        .is_empty());
}

#[tokio::test]
async fn missing_key_degrades_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = RecipeClient::new(None, "llama-test").with_base_url(mock_server.uri());
    assert!(client
        .suggest_recipes(&ingredients(&["eggs"]), None)
        .await
        .is_empty());
    assert!(client
        .generate_metadata("Omelette", &ingredients(&["eggs"]))
        .await
        .is_none());
}

// ── generate_metadata ────────────────────────────────────────────────

#[tokio::test]
async fn generate_metadata_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "```json\n{\"time\": \"15 mins\", \"difficulty\": \"Easy\", \"servings\": \"2 people\"}\n```",
        )))
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    let meta = client
        .generate_metadata("Omelette", &ingredients(&["eggs"]))
        .await
        .unwrap();

    assert_eq!(meta.time, "15 mins");
    assert_eq!(meta.difficulty, "Easy");
    assert_eq!(meta.servings, "2 people");
}

#[tokio::test]
async fn generate_metadata_without_content_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&mock_server)
        .await;

    let client = client_with_mock(&mock_server.uri());
    assert!(client
        .generate_metadata("Omelette", &ingredients(&["eggs"]))
        .await
        .is_none());
}
