//! End-to-end tests for the roadmap REST API.
//! Spins up the REST server on a random port and sends raw HTTP requests.

use roadmapd::{config::Config, identity, rest, AppContext};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const SAMPLE_MARKDOWN: &str = "\
# AI Roadmap

#### **Day 1–3: Foundations**
Learn **Linear Algebra** basics.
- [3Blue1Brown](https://www.3blue1brown.com)

#### **Day 4–7: Python**
Work through **NumPy** and **Pandas**.
- [Python docs](https://docs.python.org)
";

/// Find a free local port by binding to port 0.
fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Boot a server on a random port; returns the context and port.
async fn start_server(dir: &TempDir) -> (Arc<AppContext>, u16) {
    let port = find_free_port();
    let config = Config::new(
        Some(port),
        Some(dir.path().to_path_buf()),
        Some("error".to_string()),
        None,
    );
    let ctx = Arc::new(AppContext::new(config).await.unwrap());

    let ctx_clone = ctx.clone();
    tokio::spawn(async move {
        let _ = rest::start_rest_server(ctx_clone).await;
    });

    // Give the server a moment to start
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    (ctx, port)
}

/// Send one raw HTTP request and return (status_code, body).
async fn request(
    port: u16,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&serde_json::Value>,
) -> (u16, serde_json::Value) {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{port}"))
        .await
        .unwrap();

    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    if let Some(t) = token {
        req.push_str(&format!("Authorization: Bearer {t}\r\n"));
    }
    if body.is_some() {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", payload.len()));
    }
    req.push_str("\r\n");
    req.push_str(&payload);

    stream.write_all(req.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let response = String::from_utf8_lossy(&buf);

    let status: u16 = response
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
        .expect("malformed status line");

    let body_start = response
        .find("\r\n\r\n")
        .map(|i| i + 4)
        .expect("no body in response");
    let json = serde_json::from_str(&response[body_start..])
        .unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let dir = TempDir::new().unwrap();
    let (_ctx, port) = start_server(&dir).await;

    let (status, json) = request(port, "GET", "/health", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"].as_str().unwrap(), env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_secs"].is_number());
}

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
    let dir = TempDir::new().unwrap();
    let (_ctx, port) = start_server(&dir).await;

    let (status, json) = request(port, "GET", "/roadmaps", None, None).await;
    assert_eq!(status, 401);
    assert_eq!(json["error"], "Not authenticated");

    // Well-formed token with no matching owner record is not-found, not 401.
    let (status, _) = request(port, "GET", "/roadmaps", Some("no-such-token"), None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn create_list_and_fetch_roundtrip() {
    let dir = TempDir::new().unwrap();
    let (ctx, port) = start_server(&dir).await;
    let (_, token) = identity::provision_owner(&ctx.storage, "Alice", "alice@example.com")
        .await
        .unwrap();

    let draft = serde_json::json!({
        "title": "AI Development",
        "description": "12-week plan",
        "markdownContent": SAMPLE_MARKDOWN,
        "prompt": "become an ML engineer",
    });
    let (status, json) = request(port, "POST", "/roadmaps", Some(&token), Some(&draft)).await;
    assert_eq!(status, 200);
    assert_eq!(json["success"], true);
    let id = json["roadmapId"].as_str().unwrap().to_string();

    let (status, json) = request(port, "GET", "/roadmaps", Some(&token), None).await;
    assert_eq!(status, 200);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"].as_str().unwrap(), id);
    assert_eq!(list[0]["name"], "AI-Development");
    assert_eq!(list[0]["language"], "TypeScript");
    assert_eq!(list[0]["languageColor"], "#3178c6");
    assert_eq!(list[0]["stars"], 0);
    // Listing entries carry no document body
    assert!(list[0].get("markdownContent").is_none());

    let (status, json) = request(port, "GET", &format!("/roadmaps/{id}"), Some(&token), None).await;
    assert_eq!(status, 200);
    assert_eq!(json["title"], "AI Development");
    let sections = json["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["dayRange"], "Day 1–3");
    assert_eq!(sections[0]["focusArea"], "Foundations");
    assert_eq!(sections[0]["topics"][0], "Linear Algebra");
    assert_eq!(sections[0]["resources"][0]["title"], "3Blue1Brown");
    assert_eq!(sections[0]["completed"], false);
    assert_eq!(json["versions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn section_completion_patch_roundtrip() {
    let dir = TempDir::new().unwrap();
    let (ctx, port) = start_server(&dir).await;
    let (_, token) = identity::provision_owner(&ctx.storage, "Bob", "bob@example.com")
        .await
        .unwrap();

    let draft = serde_json::json!({
        "title": "ML Plan",
        "markdownContent": SAMPLE_MARKDOWN,
    });
    let (_, json) = request(port, "POST", "/roadmaps", Some(&token), Some(&draft)).await;
    let id = json["roadmapId"].as_str().unwrap().to_string();

    let patch = serde_json::json!({ "sectionIndex": 1, "completed": true });
    let (status, json) = request(
        port,
        "PATCH",
        &format!("/roadmaps/{id}"),
        Some(&token),
        Some(&patch),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json["success"], true);

    let (_, json) = request(port, "GET", &format!("/roadmaps/{id}"), Some(&token), None).await;
    let sections = json["sections"].as_array().unwrap();
    assert_eq!(sections[0]["completed"], false);
    assert_eq!(sections[1]["completed"], true);

    // Out-of-range index is a validation error
    let patch = serde_json::json!({ "sectionIndex": 99, "completed": true });
    let (status, _) = request(
        port,
        "PATCH",
        &format!("/roadmaps/{id}"),
        Some(&token),
        Some(&patch),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn edits_append_versions_and_reparse_sections() {
    let dir = TempDir::new().unwrap();
    let (ctx, port) = start_server(&dir).await;
    let (_, token) = identity::provision_owner(&ctx.storage, "Cleo", "cleo@example.com")
        .await
        .unwrap();

    let draft = serde_json::json!({
        "title": "Plan",
        "markdownContent": SAMPLE_MARKDOWN,
    });
    let (_, json) = request(port, "POST", "/roadmaps", Some(&token), Some(&draft)).await;
    let id = json["roadmapId"].as_str().unwrap().to_string();

    // Complete the first section, then submit an edit that keeps its day range.
    let patch = serde_json::json!({ "sectionIndex": 0, "completed": true });
    request(port, "PATCH", &format!("/roadmaps/{id}"), Some(&token), Some(&patch)).await;

    let edited = "#### **Day 1–3: Foundations**\nRevised.\n\n#### **Day 8–10: Projects**\nBuild **something**.\n";
    let edit = serde_json::json!({ "markdownContent": edited, "prompt": "shorter" });
    let (status, json) = request(
        port,
        "PUT",
        &format!("/roadmaps/{id}"),
        Some(&token),
        Some(&edit),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json["success"], true);

    let (_, json) = request(port, "GET", &format!("/roadmaps/{id}"), Some(&token), None).await;
    assert_eq!(json["markdownContent"].as_str().unwrap(), edited);
    assert_eq!(json["versions"].as_array().unwrap().len(), 2);
    let sections = json["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    // Completion carried forward for the surviving day range, reset for the new one.
    assert_eq!(sections[0]["completed"], true);
    assert_eq!(sections[1]["completed"], false);
}

#[tokio::test]
async fn roadmaps_are_scoped_to_their_owner() {
    let dir = TempDir::new().unwrap();
    let (ctx, port) = start_server(&dir).await;
    let (_, alice) = identity::provision_owner(&ctx.storage, "Alice", "a@example.com")
        .await
        .unwrap();
    let (_, mallory) = identity::provision_owner(&ctx.storage, "Mallory", "m@example.com")
        .await
        .unwrap();

    let draft = serde_json::json!({
        "title": "Private Plan",
        "markdownContent": SAMPLE_MARKDOWN,
    });
    let (_, json) = request(port, "POST", "/roadmaps", Some(&alice), Some(&draft)).await;
    let id = json["roadmapId"].as_str().unwrap().to_string();

    // Another owner cannot see or touch it.
    let (status, _) = request(port, "GET", &format!("/roadmaps/{id}"), Some(&mallory), None).await;
    assert_eq!(status, 404);

    let patch = serde_json::json!({ "sectionIndex": 0, "completed": true });
    let (status, _) = request(
        port,
        "PATCH",
        &format!("/roadmaps/{id}"),
        Some(&mallory),
        Some(&patch),
    )
    .await;
    assert_eq!(status, 404);

    let (_, json) = request(port, "GET", "/roadmaps", Some(&mallory), None).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn malformed_json_bodies_get_the_error_envelope() {
    let dir = TempDir::new().unwrap();
    let (ctx, port) = start_server(&dir).await;
    let (_, token) = identity::provision_owner(&ctx.storage, "Eve", "e@example.com")
        .await
        .unwrap();

    let payload = "{not json";
    let req = format!(
        "POST /roadmaps HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
         Authorization: Bearer {token}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\n\r\n{payload}",
        payload.len()
    );
    let mut stream = TcpStream::connect(format!("127.0.0.1:{port}"))
        .await
        .unwrap();
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let response = String::from_utf8_lossy(&buf);

    let first_line = response.lines().next().unwrap_or("");
    assert!(first_line.contains("400"), "expected 400, got: {first_line}");

    // Same JSON error shape as every other failure, not a plain-text body.
    let body_start = response.find("\r\n\r\n").map(|i| i + 4).unwrap();
    let json: serde_json::Value = serde_json::from_str(&response[body_start..])
        .expect("rejection body should be JSON");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn empty_drafts_are_rejected() {
    let dir = TempDir::new().unwrap();
    let (ctx, port) = start_server(&dir).await;
    let (_, token) = identity::provision_owner(&ctx.storage, "Dana", "d@example.com")
        .await
        .unwrap();

    let draft = serde_json::json!({ "title": "  ", "markdownContent": SAMPLE_MARKDOWN });
    let (status, _) = request(port, "POST", "/roadmaps", Some(&token), Some(&draft)).await;
    assert_eq!(status, 400);

    let draft = serde_json::json!({ "title": "Plan", "markdownContent": "" });
    let (status, _) = request(port, "POST", "/roadmaps", Some(&token), Some(&draft)).await;
    assert_eq!(status, 400);
}
