//! Socket-level smoke test: a real tiny_http listener on an ephemeral port.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use common::*;
use vocab_detect::http;

fn start_server() -> (String, Arc<FakeEngine>, tempfile::TempDir) {
    let (ctx, engine, dir) = create_test_context();
    let server = http::bind("127.0.0.1:0").expect("Failed to bind test server");
    let port = server
        .server_addr()
        .to_ip()
        .expect("listener should be on an IP socket")
        .port();
    let ctx = Arc::new(ctx);
    std::thread::spawn(move || http::serve(server, ctx));
    (format!("http://127.0.0.1:{}", port), engine, dir)
}

fn read_json(resp: ureq::Response) -> anyhow::Result<Value> {
    Ok(serde_json::from_str(&resp.into_string()?)?)
}

#[test]
fn test_server_round_trip() -> anyhow::Result<()> {
    let (base, engine, _dir) = start_server();

    let resp = ureq::get(&format!("{}/", base)).call()?;
    assert_eq!(resp.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(read_json(resp)?["version"], "1.0");

    let resp = ureq::post(&format!("{}/model/classes", base))
        .set("Content-Type", "application/json")
        .send_string(&json!({"classes": ["person"]}).to_string())?;
    assert_eq!(read_json(resp)?["classes"], json!(["person"]));

    engine.script(vec![raw(0, 0.95, [2.0, 2.0, 20.0, 20.0])]);
    let png = png_bytes(32, 32);
    let resp = ureq::post(&format!("{}/detect", base))
        .set("Content-Type", &multipart_content_type())
        .send_bytes(&multipart_body(&[image_part(&png)]))?;
    let b = read_json(resp)?;
    assert_eq!(b["message"], "Found 1 objects");
    assert_eq!(b["detections"][0]["class"], "person");
    Ok(())
}

#[test]
fn test_server_error_statuses() -> anyhow::Result<()> {
    let (base, _engine, _dir) = start_server();

    match ureq::get(&format!("{}/missing", base)).call() {
        Err(ureq::Error::Status(404, resp)) => assert_eq!(read_json(resp)?["detail"], "Not Found"),
        other => panic!("expected 404, got {:?}", other.map(|r| r.status())),
    }

    let resp = ureq::request("OPTIONS", &format!("{}/detect", base)).call()?;
    assert_eq!(resp.status(), 204);
    assert!(resp.header("Access-Control-Allow-Methods").is_some());
    Ok(())
}
