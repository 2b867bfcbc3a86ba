mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

use common::{create_note, register, PASSWORD};

#[tokio::test]
async fn stats_summarize_notes() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let account = register(&client, server).await?;

    let res = client
        .get(server.url("/api/account/stats"))
        .bearer_auth(&account.access_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["totalNotes"], 0);
    assert_eq!(body["data"]["oldestNote"], Value::Null);

    create_note(&client, server, &account, json!({ "title": "A", "content": "a", "category": "Work", "isPinned": true })).await?;
    create_note(&client, server, &account, json!({ "title": "B", "content": "b", "category": "Work" })).await?;
    create_note(&client, server, &account, json!({ "title": "C", "content": "c" })).await?;

    let res = client
        .get(server.url("/api/account/stats"))
        .bearer_auth(&account.access_token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["totalNotes"], 3);
    assert_eq!(body["data"]["pinnedNotes"], 1);
    assert_eq!(body["data"]["uniqueCategories"], 1);
    assert!(body["data"]["newestNote"].is_string());
    Ok(())
}

#[tokio::test]
async fn export_is_a_downloadable_document() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let account = register(&client, server).await?;
    create_note(&client, server, &account, json!({ "title": "A", "content": "a", "category": "Work" })).await?;
    create_note(&client, server, &account, json!({ "title": "B", "content": "b", "isPinned": true })).await?;

    let res = client
        .get(server.url("/api/account/export"))
        .bearer_auth(&account.access_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let disposition = res
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"mini-notes-data-export-"));
    assert!(disposition.ends_with(".json\""));

    let doc: Value = res.json().await?;
    assert!(doc.get("success").is_none());
    assert_eq!(doc["exportVersion"], "1.0.0");
    assert_eq!(doc["user"]["id"], account.id);
    assert!(doc["user"].get("passwordHash").is_none());
    assert_eq!(doc["notes"].as_array().map(Vec::len), Some(2));
    assert_eq!(doc["statistics"]["totalNotes"], 2);
    assert_eq!(doc["statistics"]["pinnedNotes"], 1);
    assert_eq!(doc["statistics"]["categoryCounts"]["Work"], 1);
    assert_eq!(doc["statistics"]["categoryCounts"]["uncategorized"], 1);
    Ok(())
}

#[tokio::test]
async fn profile_updates_and_conflicts() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let account = register(&client, server).await?;
    let other = register(&client, server).await?;
    let (new_name, new_email) = common::unique_identity();

    let res = client
        .patch(server.url("/api/account/profile"))
        .bearer_auth(&account.access_token)
        .json(&json!({ "username": new_name, "email": new_email.to_uppercase() }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["username"], new_name.as_str());
    assert_eq!(body["data"]["email"], new_email.as_str());

    let res = client
        .patch(server.url("/api/account/profile"))
        .bearer_auth(&account.access_token)
        .json(&json!({ "username": other.username }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "This username is already taken");

    let res = client
        .patch(server.url("/api/account/profile"))
        .bearer_auth(&account.access_token)
        .json(&json!({ "email": other.email }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "This email is already registered");

    let res = client
        .patch(server.url("/api/account/profile"))
        .bearer_auth(&account.access_token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn delete_account_removes_notes_by_default() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let account = register(&client, server).await?;
    let observer = register(&client, server).await?;
    let note = create_note(&client, server, &account, json!({ "title": "Bye", "content": "x" })).await?;

    let res = client.delete(server.url("/api/account")).bearer_auth(&account.access_token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["deletedNotes"], 1);
    assert_eq!(body["data"]["anonymizedNotes"], 0);

    let res = client
        .get(server.url(&format!("/api/notes/{}", note["id"])))
        .bearer_auth(&observer.access_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": account.email, "password": PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(server.url("/api/auth/refresh"))
        .json(&json!({ "refreshToken": account.refresh_token }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "User account no longer exists");
    Ok(())
}

#[tokio::test]
async fn delete_account_can_keep_notes_anonymized() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let client = reqwest::Client::new();
    let account = register(&client, server).await?;
    let observer = register(&client, server).await?;
    let note = create_note(&client, server, &account, json!({ "title": "Keep", "content": "x" })).await?;

    let res = client
        .delete(server.url("/api/account"))
        .bearer_auth(&account.access_token)
        .json(&json!({ "deleteNotes": false }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["deletedNotes"], 0);
    assert_eq!(body["data"]["anonymizedNotes"], 1);

    // The row survives without an owner, so nobody may read it
    let res = client
        .get(server.url(&format!("/api/notes/{}", note["id"])))
        .bearer_auth(&observer.access_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Deletion is limited to one attempt per hour per user
    let res = client.delete(server.url("/api/account")).bearer_auth(&account.access_token).send().await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));
    Ok(())
}
