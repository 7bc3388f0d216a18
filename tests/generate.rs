mod common;

use serde_json::{Value, json};

use common::test_server::{ENV_ADMIN, TestServer};

async fn body(response: reqwest::Response) -> Value {
    response.json().await.expect("parse response body")
}

fn curated_corpus() -> Vec<u8> {
    let lines = [
        json!({
            "input_prompt": "arduino uno case with snap-fit lid",
            "generated_code": "module case() { cube([75, 55, 20]); }",
        }),
        json!({
            "input_prompt": "a 12-tooth gear",
            "generated_code": "module gear() { circle(10); }",
        }),
    ];
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.to_string());
        out.push('\n');
    }
    out.into_bytes()
}

#[tokio::test]
async fn test_generate_without_knowledge_sources() {
    let server = TestServer::start().await;
    let token = server.issue_token("user@example.com");

    let response = server
        .post_json("/api/v1/generate", &token, json!({ "prompt": "a hinge" }))
        .await;
    assert_eq!(response.status(), 200);
    let body = body(response).await;
    assert!(body["data"]["code"].as_str().unwrap().contains("module generated()"));
    assert_eq!(body["data"]["examples_used"], 0);
    assert!(body["data"]["provenance"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_samples_curated_feedback() {
    let server = TestServer::start().await;
    let admin_token = server.issue_token(ENV_ADMIN);
    let user_token = server.issue_token("user@example.com");

    let response = server
        .upload(
            "/api/v1/admin/curated",
            &admin_token,
            "curated.jsonl",
            curated_corpus(),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = server
        .post_json(
            "/api/v1/generate",
            &user_token,
            json!({ "prompt": "an arduino case" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = body(response).await;

    // Only the matching example is sampled, and the mock backend echoes
    // the assembled preamble back so we can see it arrived.
    assert_eq!(body["data"]["examples_used"], 1);
    let code = body["data"]["code"].as_str().unwrap();
    assert!(code.contains("module case()"));
    assert!(!code.contains("module gear()"));

    let provenance = body["data"]["provenance"].as_array().unwrap();
    assert_eq!(provenance.len(), 1);
    assert_eq!(provenance[0]["path"], "curated/global.jsonl");
    assert_eq!(provenance[0]["source_tag"], "curated-feedback");
    assert!(provenance[0]["bytes_used"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_generate_samples_training_assets() {
    let server = TestServer::start().await;
    let admin_token = server.issue_token(ENV_ADMIN);
    let user_token = server.issue_token("user@example.com");

    let line = json!({
        "input_prompt": "parametric bracket with bolt holes",
        "generated_code": "module bracket() { difference() { cube(10); } }",
    });
    let response = server
        .upload(
            "/api/v1/admin/assets",
            &admin_token,
            "brackets.jsonl",
            format!("{line}\n").into_bytes(),
            Some("training"),
        )
        .await;
    assert_eq!(response.status(), 201);
    let object_path = body(response).await["data"]["asset"]["object_path"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server
        .post_json(
            "/api/v1/generate",
            &user_token,
            json!({ "prompt": "a bracket with holes" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = body(response).await;

    assert_eq!(body["data"]["examples_used"], 1);
    let provenance = body["data"]["provenance"].as_array().unwrap();
    assert_eq!(provenance.len(), 1);
    assert_eq!(provenance[0]["path"], object_path);
    assert_eq!(provenance[0]["source_tag"], "training-asset");
}

#[tokio::test]
async fn test_generate_ignores_untagged_assets() {
    let server = TestServer::start().await;
    let admin_token = server.issue_token(ENV_ADMIN);
    let user_token = server.issue_token("user@example.com");

    let line = json!({
        "input_prompt": "a bracket",
        "generated_code": "module bracket() {}",
    });
    let response = server
        .upload(
            "/api/v1/admin/assets",
            &admin_token,
            "brackets.jsonl",
            format!("{line}\n").into_bytes(),
            None,
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = server
        .post_json(
            "/api/v1/generate",
            &user_token,
            json!({ "prompt": "a bracket" }),
        )
        .await;
    let body = body(response).await;
    assert_eq!(body["data"]["examples_used"], 0);
    assert!(body["data"]["provenance"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_save_as_persists_design() {
    let server = TestServer::start().await;
    let token = server.issue_token("user@example.com");

    let response = server
        .post_json(
            "/api/v1/generate",
            &token,
            json!({ "prompt": "a hinge", "save_as": "My hinge" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let generated = body(response).await;
    let design = &generated["data"]["design"];
    assert_eq!(design["name"], "My hinge");
    assert_eq!(design["prompt"], "a hinge");
    assert_eq!(design["code"], generated["data"]["code"]);

    let id = design["id"].as_str().unwrap();
    let response = server
        .get(&format!("/api/v1/designs/{id}"), Some(&token))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(body(response).await["data"]["name"], "My hinge");
}

#[tokio::test]
async fn test_generate_rejects_empty_prompt() {
    let server = TestServer::start().await;
    let token = server.issue_token("user@example.com");

    let response = server
        .post_json("/api/v1/generate", &token, json!({ "prompt": "   " }))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(body(response).await["code"], "bad_request");
}

#[tokio::test]
async fn test_generate_requires_auth() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(format!("{}/api/v1/generate", server.base_url))
        .json(&json!({ "prompt": "a hinge" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    assert_eq!(body(response).await["code"], "auth_required");
}
