//! End-to-end tests against a live mock server.

use std::time::{Duration, Instant};

use api_mocker::config::watcher::ReloadRequest;
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{client, start_server, Fixture};

fn fixture() -> Fixture {
    Fixture::new()
        .mock("king.json", r#"{"name":"king"}"#)
        .mock("ace.json", r#"{"name":"ace"}"#)
        .mock("xml/queen.xml", "<queen/>")
        .mock("productId123.product.json", r#"{"id":"123"}"#)
        .mock("productId678.product.json", r#"{"id":"678"}"#)
}

#[tokio::test]
async fn test_legacy_config_serves_all_routes() {
    let fixture = fixture();
    fixture.write_config(json!({
        "webServices": {
            "get": {
                "first": "king.json",
                "nested/ace": "ace.json",
                "var/:id": "xml/queen.xml"
            },
            "post": {"first": "king.json"},
            "all": {"queen": "xml/queen.xml"}
        }
    }));
    let server = start_server(fixture.mocker()).await;
    let client = client();

    let res = client.get(server.url("/first")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.text().await.unwrap(), r#"{"name":"king"}"#);

    let res = client.post(server.url("/first")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/nested/ace")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), r#"{"name":"ace"}"#);

    let res = client.get(server.url("/var/42")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "<queen/>");

    let res = client.put(server.url("/queen")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "<queen/>");

    let res = client.delete(server.url("/first")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let res = client.get(server.url("/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_response_overrides() {
    let fixture = fixture();
    fixture.write_config(json!({
        "webServices": {
            "second": {
                "verbs": ["delete", "post"],
                "responses": {
                    "delete": {"httpStatus": 204},
                    "post": {"contentType": "text/plain", "mockFile": "king.json", "httpStatus": 201}
                }
            }
        }
    }));
    let server = start_server(fixture.mocker()).await;
    let client = client();

    let res = client.post(server.url("/second")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(res.text().await.unwrap(), r#"{"name":"king"}"#);

    // no mock file for delete: fails at request time
    let res = client.delete(server.url("/second")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_switch_selects_mock_file() {
    let fixture = fixture();
    fixture.write_config(json!({
        "webServices": {
            "product": {
                "mockFile": "product.json",
                "switch": "productId",
                "verbs": ["get", "post"]
            },
            "product/:productId": {
                "mockFile": "product.json",
                "switch": "productId",
                "verbs": ["get"]
            }
        }
    }));
    let server = start_server(fixture.mocker()).await;
    let client = client();

    let res = client
        .get(server.url("/product?productId=123"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"id": "123"}));

    let res = client
        .post(server.url("/product"))
        .json(&json!({"productId": "678"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"id": "678"}));

    let res = client.get(server.url("/product/678")).send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"id": "678"}));

    // switched file does not exist
    let res = client
        .get(server.url("/product?productId=999"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_params_named_differently_per_path() {
    let fixture = fixture();
    fixture.write_config(json!({
        "webServices": {"first": {"mockFile": "king.json", "verbs": ["get"]}}
    }));
    let server = start_server(fixture.mocker()).await;
    let client = client();

    let conflicting = json!({
        "webServices": {
            "var/:id": {"mockFile": "king.json", "verbs": ["get"]},
            "var/:productId": {"mockFile": "product.json", "switch": "productId", "verbs": ["post"]}
        }
    });
    fixture.write_config(conflicting);
    let res = client.get(server.url("/admin/reload")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url("/var/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"name":"king"}"#);

    let res = client.post(server.url("/var/123")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"id": "123"}));

    // the same map also starts a fresh server
    let fresh = start_server(fixture.mocker()).await;
    let res = client.get(fresh.url("/var/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    fresh.shutdown.trigger();
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_latency_delays_response() {
    let fixture = fixture();
    fixture.write_config(json!({
        "latency": 150,
        "webServices": {
            "slow": {"mockFile": "king.json", "verbs": ["get"]},
            "fast": {"mockFile": "king.json", "verbs": ["get"], "latency": 0}
        }
    }));
    let server = start_server(fixture.mocker()).await;
    let client = client();

    let start = Instant::now();
    let res = client.get(server.url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(start.elapsed() >= Duration::from_millis(150));

    let res = client.get(server.url("/fast")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_allowed_domains() {
    let fixture = fixture();
    fixture.write_config(json!({
        "allowedDomains": ["http://abc.test"],
        "webServices": {"first": {"mockFile": "king.json", "verbs": ["get"]}}
    }));
    let server = start_server(fixture.mocker()).await;
    let client = client();

    let res = client
        .get(server.url("/first"))
        .header("Origin", "http://abc.test")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["access-control-allow-origin"], "http://abc.test");
    assert!(res.headers().contains_key("x-request-id"));

    let res = client
        .get(server.url("/first"))
        .header("Origin", "http://other.test")
        .send()
        .await
        .unwrap();
    assert!(!res.headers().contains_key("access-control-allow-origin"));

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_reload_endpoint_picks_up_config_changes() {
    let fixture = fixture();
    fixture.write_config(json!({
        "webServices": {"first": {"mockFile": "king.json", "verbs": ["get"]}}
    }));
    let server = start_server(fixture.mocker()).await;
    let client = client();

    let res = client.get(server.url("/ace")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    fixture.write_config(json!({
        "webServices": {"ace": {"mockFile": "ace.json", "verbs": ["get"]}}
    }));
    let res = client.get(server.url("/admin/reload")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["routes"], 1);

    let res = client.get(server.url("/ace")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(server.url("/first")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // a broken file keeps the current routes
    std::fs::write(fixture.config_path(), "{ broken").unwrap();
    let res = client.get(server.url("/admin/reload")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let res = client.get(server.url("/ace")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_reload_request_channel() {
    let fixture = fixture();
    fixture.write_config(json!({
        "webServices": {"first": {"mockFile": "king.json", "verbs": ["get"]}}
    }));
    let server = start_server(fixture.mocker()).await;
    let client = client();

    fixture.write_config(json!({
        "webServices": {"ace": {"mockFile": "ace.json", "verbs": ["get"]}}
    }));
    server.reload_tx.send(ReloadRequest).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let res = client.get(server.url("/ace")).send().await.unwrap();
        if res.status() == StatusCode::OK {
            break;
        }
        assert!(Instant::now() < deadline, "reload was not applied");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let fixture = fixture();
    fixture.write_config(json!({}));
    let server = start_server(fixture.mocker()).await;

    server.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
