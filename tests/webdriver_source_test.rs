use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::{Json, Router};
use hypewatch::document::{Element, Query};
use hypewatch::engine::MessageKind;
use hypewatch::{
    Config, Document, DocumentError, DocumentSource, MockNotifier, Monitor, MonitorError, WebDriverSource,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const SESSION: &str = "/session/s-1";

/// Minimal W3C WebDriver endpoint serving a canned vault page.
#[derive(Clone, Default)]
struct FakeDriver {
    requests: Arc<Mutex<Vec<String>>>,
    /// Replies keyed by (scope element, xpath); `None` scope is the document.
    elements: Arc<HashMap<(Option<String>, String), Vec<String>>>,
    texts: Arc<HashMap<String, String>>,
    fail_navigation: bool,
}

impl FakeDriver {
    fn vault_page() -> Self {
        let mut elements = HashMap::new();
        elements.insert(
            (None, ".//*[text()[contains(., 'Perpetual Positions')]]".to_string()),
            vec!["heading".to_string()],
        );
        elements.insert(
            (
                Some("heading".to_string()),
                "ancestor-or-self::*[.//table][1]".to_string(),
            ),
            vec!["section".to_string()],
        );
        elements.insert(
            (Some("section".to_string()), ".//table".to_string()),
            vec!["positions".to_string()],
        );
        elements.insert(
            (Some("positions".to_string()), ".//tbody//tr".to_string()),
            vec!["row-0".to_string(), "row-1".to_string()],
        );

        let rows = [["BTC", "10x", "3", "$65,000"], ["ETH", "5x", "-2", "3,500"]];
        let mut texts = HashMap::new();
        for (r, cells) in rows.iter().enumerate() {
            let ids: Vec<String> = (0..cells.len()).map(|c| format!("cell-{}-{}", r, c)).collect();
            for (id, text) in ids.iter().zip(cells.iter()) {
                texts.insert(id.clone(), text.to_string());
            }
            elements.insert((Some(format!("row-{}", r)), ".//td".to_string()), ids);
        }

        Self {
            elements: Arc::new(elements),
            texts: Arc::new(texts),
            ..Default::default()
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn ok(value: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "value": value })))
}

fn driver_error(status: StatusCode, error: &str, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "value": { "error": error, "message": message, "stacktrace": "" } })),
    )
}

async fn dispatch(
    State(driver): State<FakeDriver>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    driver
        .requests
        .lock()
        .unwrap()
        .push(format!("{} {}", method, path));

    if method == Method::POST && path == "/session" {
        return ok(json!({ "sessionId": "s-1", "capabilities": {} }));
    }
    let Some(command) = path.strip_prefix(SESSION) else {
        return driver_error(StatusCode::NOT_FOUND, "invalid session id", "no such session");
    };

    match (method, command) {
        (Method::DELETE, "") => ok(Value::Null),
        (Method::POST, "/url") if driver.fail_navigation => driver_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unknown error",
            "net::ERR_NAME_NOT_RESOLVED",
        ),
        (Method::POST, "/url") => ok(Value::Null),
        (Method::POST, "/execute/sync") => ok(json!("complete")),
        (Method::POST, cmd) if cmd.ends_with("/elements") => {
            let scope = cmd
                .strip_prefix("/element/")
                .and_then(|rest| rest.strip_suffix("/elements"))
                .map(str::to_string);
            if scope.as_deref() == Some("gone") {
                return driver_error(StatusCode::NOT_FOUND, "stale element reference", "detached");
            }
            let xpath = body["value"].as_str().unwrap_or_default().to_string();
            let ids = driver.elements.get(&(scope, xpath)).cloned().unwrap_or_default();
            ok(Value::Array(
                ids.into_iter().map(|id| json!({ ELEMENT_KEY: id })).collect(),
            ))
        }
        (Method::GET, cmd) if cmd.ends_with("/text") => {
            let id = cmd
                .trim_start_matches("/element/")
                .trim_end_matches("/text");
            match driver.texts.get(id) {
                Some(text) => ok(json!(text)),
                None => ok(json!("")),
            }
        }
        _ => driver_error(StatusCode::NOT_FOUND, "unknown command", &path),
    }
}

async fn spawn_driver(driver: FakeDriver) -> String {
    let app = Router::new().fallback(dispatch).with_state(driver);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config(webdriver_url: String) -> Config {
    Config {
        source_url: "https://app.hyperliquid.xyz/vaults/0xtest".to_string(),
        webdriver_url,
        table_wait: Duration::from_secs(5),
        poll_interval: Duration::from_millis(100),
        network_idle_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_monitor_cycle_over_webdriver() {
    let driver = FakeDriver::vault_page();
    let url = spawn_driver(driver.clone()).await;
    let config = config(url);
    let notifier = MockNotifier::new();
    let monitor = Monitor::new(
        config.clone(),
        Arc::new(WebDriverSource::from_config(&config)),
        Arc::new(notifier.clone()),
    );

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.positions.len(), 2);
    assert_eq!(report.exceeding, 1);
    assert_eq!(report.message.kind, MessageKind::Alert);
    let (_, body) = &notifier.sent()[0];
    assert!(body.contains("- Coin: BTC\n  Leverage: 10x\n  Size: 3\n  Mark Price: $65,000.00"));
    assert!(body.contains("  Position Value (Size × Mark): $195,000.00"));

    let requests = driver.requests();
    assert_eq!(requests.first().map(String::as_str), Some("POST /session"));
    assert!(requests.contains(&"POST /session/s-1/url".to_string()));
    assert_eq!(requests.last().map(String::as_str), Some("DELETE /session/s-1"));
}

#[tokio::test]
async fn test_failed_navigation_releases_session() {
    let driver = FakeDriver {
        fail_navigation: true,
        ..FakeDriver::vault_page()
    };
    let url = spawn_driver(driver.clone()).await;
    let source = WebDriverSource::new(url);

    let err = source.open("https://unreachable.invalid").await.unwrap_err();

    assert!(matches!(err, DocumentError::Http { status: 500, ref message } if message.contains("ERR_NAME_NOT_RESOLVED")));
    assert_eq!(
        driver.requests(),
        vec![
            "POST /session".to_string(),
            "POST /session/s-1/url".to_string(),
            "DELETE /session/s-1".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_document_queries_and_stale_elements() {
    let driver = FakeDriver::vault_page();
    let url = spawn_driver(driver.clone()).await;
    let document = WebDriverSource::new(url)
        .open("https://app.hyperliquid.xyz/vaults/0xtest")
        .await
        .unwrap();

    let headings = document
        .query_all(None, &Query::text("Perpetual Positions"))
        .await
        .unwrap();
    assert_eq!(headings.len(), 1);
    assert_eq!(headings[0].id(), "heading");

    let cells = document
        .query_all(Some(&Element::new("row-1")), &Query::tag("td"))
        .await
        .unwrap();
    assert_eq!(cells.len(), 4);
    assert_eq!(document.inner_text(&cells[2]).await.unwrap(), "-2");

    let err = document
        .query_all(Some(&Element::new("gone")), &Query::tag("td"))
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::StaleElement(ref m) if m == "detached"));

    document.close().await.unwrap();
    assert_eq!(driver.requests().last().map(String::as_str), Some("DELETE /session/s-1"));
}

#[tokio::test]
async fn test_monitor_fails_when_driver_has_no_table() {
    let driver = FakeDriver::default();
    let url = spawn_driver(driver.clone()).await;
    let config = Config {
        table_wait: Duration::from_millis(300),
        ..config(url)
    };
    let notifier = MockNotifier::new();
    let monitor = Monitor::new(
        config.clone(),
        Arc::new(WebDriverSource::from_config(&config)),
        Arc::new(notifier.clone()),
    );

    let err = monitor.run_cycle().await.unwrap_err();

    assert!(matches!(err, MonitorError::TableNotFound { .. }));
    assert!(notifier.sent().is_empty());
    assert_eq!(driver.requests().last().map(String::as_str), Some("DELETE /session/s-1"));
}
