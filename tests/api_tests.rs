// tests/api_tests.rs
//
// End-to-end tests for auth, question management, and the english
// correction flow.

mod common;

use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/api/nope", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_rejects_invalid_payloads() {
    let app = spawn_app().await;

    // Username too short, email malformed, password too short.
    let cases = [
        json!({ "username": "ab", "email": "a@b.com", "password": "password123" }),
        json!({ "username": "alice", "email": "not-an-email", "password": "password123" }),
        json!({ "username": "alice", "email": "a@b.com", "password": "short" }),
    ];

    for case in cases {
        let response = app
            .client
            .post(format!("{}/api/auth/register", app.address))
            .json(&case)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "payload: {}", case);
    }
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let app = spawn_app().await;

    let payload = json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": "password123",
    });

    let first = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = spawn_app().await;
    app.register_and_login("bob").await;

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({ "username": "bob", "password": "wrongpassword" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn me_reflects_session_and_logout_revokes_it() {
    let app = spawn_app().await;
    let token = app.register_and_login("carol").await;

    let response = app
        .client
        .get(format!("{}/api/auth/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let profile: serde_json::Value = response.json().await.unwrap();
    assert_eq!(profile["username"], "carol");
    assert_eq!(profile["role"], "user");
    assert_eq!(profile["compositions_count"], 0);

    let logout = app
        .client
        .post(format!("{}/api/auth/logout", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status().as_u16(), 200);

    // Same token no longer works.
    let after = app
        .client
        .get(format!("{}/api/auth/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(after.status().as_u16(), 401);
}

#[tokio::test]
async fn challenge_can_be_verified_once() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/api/auth/challenge", app.address))
        .json(&json!({ "username": "dave", "purpose": "registration" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    let challenge = body["challenge"].as_str().unwrap().to_string();
    assert_eq!(body["expires_in"], 300);

    let verify = app
        .client
        .post(format!("{}/api/auth/challenge/verify", app.address))
        .json(&json!({ "challenge": challenge }))
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status().as_u16(), 200);

    let again = app
        .client
        .post(format!("{}/api/auth/challenge/verify", app.address))
        .json(&json!({ "challenge": challenge }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);
}

#[tokio::test]
async fn question_creation_requires_admin() {
    let app = spawn_app().await;

    let payload = json!({
        "subject": "math",
        "question_text": "1+1?",
        "correct_answer": "2",
    });

    // No token at all.
    let anonymous = app
        .client
        .post(format!("{}/api/questions", app.address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    // Regular user.
    let token = app.register_and_login("erin").await;
    let forbidden = app
        .client
        .post(format!("{}/api/questions", app.address))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);
}

#[tokio::test]
async fn question_crud_flow() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let id = app.create_question(&admin, "math", "What is 2+2?").await;

    // Listing by subject picks the question up.
    let list = app
        .client
        .get(format!("{}/api/questions?subject=math", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(list.status().as_u16(), 200);
    let questions: serde_json::Value = list.json().await.unwrap();
    assert_eq!(questions.as_array().unwrap().len(), 1);
    assert_eq!(questions[0]["question_text"], "What is 2+2?");

    // Update the text; the cached listing must reflect it.
    let update = app
        .client
        .put(format!("{}/api/questions/{}", app.address, id))
        .bearer_auth(&admin)
        .json(&json!({ "question_text": "What is 3+3?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status().as_u16(), 200);

    let list: serde_json::Value = app
        .client
        .get(format!("{}/api/questions?subject=math", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list[0]["question_text"], "What is 3+3?");

    // Soft delete removes it from listings.
    let delete = app
        .client
        .delete(format!("{}/api/questions/{}", app.address, id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status().as_u16(), 204);

    let list: serde_json::Value = app
        .client
        .get(format!("{}/api/questions?subject=math", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.as_array().unwrap().is_empty());

    // Updating the deleted question is a 404.
    let gone = app
        .client
        .put(format!("{}/api/questions/{}", app.address, id))
        .bearer_auth(&admin)
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn import_reports_per_item_errors() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let content = json!([
        { "subject": "math", "question_text": "ok?", "correct_answer": "yes" },
        { "subject": "math", "correct_answer": "missing text" },
    ])
    .to_string();

    let response = app
        .client
        .post(format!("{}/api/questions/import", app.address))
        .bearer_auth(&admin)
        .json(&json!({ "format": "json", "content": content }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["success"], 1);
    assert_eq!(result["failed"], 1);
    assert_eq!(result["errors"][0]["index"], 1);
}

#[tokio::test]
async fn export_rejects_excel_with_501() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/api/questions/export?format=excel", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 501);
}

#[tokio::test]
async fn export_csv_has_headers_and_rows() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;
    app.create_question(&admin, "math", "What is 2+2?").await;

    let response = app
        .client
        .get(format!(
            "{}/api/questions/export?format=csv&subject=math",
            app.address
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/csv"
    );

    let body = response.text().await.unwrap();
    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("id,subject,title"));
    assert!(lines.next().unwrap().contains("What is 2+2?"));
}

#[tokio::test]
async fn compose_stores_and_returns_correction() {
    let app = spawn_app().await;
    let token = app.register_and_login("frank").await;

    let response = app
        .client
        .post(format!("{}/api/english/compose", app.address))
        .bearer_auth(&token)
        .json(&json!({ "text": "I has a apple." }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let id = body["id"].as_i64().unwrap();
    assert_eq!(body["original_text"], "I has a apple.");
    assert_eq!(body["corrected_text"], "I has a apple.");
    assert_eq!(body["sgif_category"], "S6");

    // History shows it, and it is fetchable by ID.
    let history: serde_json::Value = app
        .client
        .get(format!("{}/api/english/history", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);

    let one = app
        .client
        .get(format!("{}/api/english/compositions/{}", app.address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(one.status().as_u16(), 200);

    // A different user cannot see it.
    let other = app.register_and_login("grace").await;
    let hidden = app
        .client
        .get(format!("{}/api/english/compositions/{}", app.address, id))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(hidden.status().as_u16(), 404);
}

#[tokio::test]
async fn profile_counts_refresh_after_composing() {
    let app = spawn_app().await;
    let token = app.register_and_login("nina").await;

    // Prime the profile cache.
    let before: serde_json::Value = app
        .client
        .get(format!("{}/api/auth/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before["compositions_count"], 0);

    let compose = app
        .client
        .post(format!("{}/api/english/compose", app.address))
        .bearer_auth(&token)
        .json(&json!({ "text": "She go to school." }))
        .send()
        .await
        .unwrap();
    assert_eq!(compose.status().as_u16(), 200);

    // The cached profile must not serve the old count.
    let after: serde_json::Value = app
        .client
        .get(format!("{}/api/auth/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["compositions_count"], 1);
}

#[tokio::test]
async fn empty_update_is_a_noop_only_for_existing_questions() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;
    let id = app.create_question(&admin, "math", "Q").await;

    let existing = app
        .client
        .put(format!("{}/api/questions/{}", app.address, id))
        .bearer_auth(&admin)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(existing.status().as_u16(), 200);

    let missing = app
        .client
        .put(format!("{}/api/questions/9999", app.address))
        .bearer_auth(&admin)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn math_endpoints_parse_and_evaluate() {
    let app = spawn_app().await;

    let parse: serde_json::Value = app
        .client
        .post(format!("{}/api/math/parse", app.address))
        .json(&json!({ "expression": "sin(x)+2" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(parse["latex"], "\\sin(x) + 2");
    assert_eq!(parse["variables"][0], "x");
    assert_eq!(parse["functions"][0], "sin");

    let eval: serde_json::Value = app
        .client
        .post(format!("{}/api/math/evaluate", app.address))
        .json(&json!({ "expression": "x^2+1", "variables": { "x": 3.0 } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(eval["value"], 10.0);

    let bad = app
        .client
        .post(format!("{}/api/math/parse", app.address))
        .json(&json!({ "expression": "2 +" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);
}

#[tokio::test]
async fn audio_upload_round_trip() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let upload = app
        .client
        .post(format!("{}/api/media/audio?subject=english", app.address))
        .bearer_auth(&admin)
        .header("content-type", "audio/mpeg")
        .body(vec![0u8; 128])
        .send()
        .await
        .unwrap();
    assert_eq!(upload.status().as_u16(), 201);

    let file: serde_json::Value = upload.json().await.unwrap();
    let id = file["id"].as_i64().unwrap();
    assert!(file["storage_key"].as_str().unwrap().starts_with("audio/english/"));
    assert!(file["storage_key"].as_str().unwrap().ends_with(".mp3"));
    assert_eq!(file["size_bytes"], 128);

    let list: serde_json::Value = app
        .client
        .get(format!("{}/api/media?subject=english", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    let delete = app
        .client
        .delete(format!("{}/api/media/{}", app.address, id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status().as_u16(), 204);
}

#[tokio::test]
async fn uploaded_audio_is_served_back() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let upload = app
        .client
        .post(format!("{}/api/media/audio?subject=math", app.address))
        .bearer_auth(&admin)
        .header("content-type", "audio/ogg")
        .body(vec![7u8; 64])
        .send()
        .await
        .unwrap();
    assert_eq!(upload.status().as_u16(), 201);

    let file: serde_json::Value = upload.json().await.unwrap();
    let id = file["id"].as_i64().unwrap();
    let key = file["storage_key"].as_str().unwrap().to_string();

    let served = app
        .client
        .get(format!("{}/media/{}", app.address, key))
        .send()
        .await
        .unwrap();
    assert_eq!(served.status().as_u16(), 200);
    assert_eq!(
        served.headers()["content-type"].to_str().unwrap(),
        "audio/ogg"
    );
    assert_eq!(served.bytes().await.unwrap().as_ref(), vec![7u8; 64]);

    // Deleting the file makes the URL dead.
    app.client
        .delete(format!("{}/api/media/{}", app.address, id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();

    let gone = app
        .client
        .get(format!("{}/media/{}", app.address, key))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn audio_upload_rejects_unknown_content_type() {
    let app = spawn_app().await;
    let admin = app.login_admin().await;

    let response = app
        .client
        .post(format!("{}/api/media/audio", app.address))
        .bearer_auth(&admin)
        .header("content-type", "video/mp4")
        .body(vec![0u8; 16])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}
