//! W3C WebDriver client: drives a real browser (chromedriver, geckodriver,
//! Selenium) over its HTTP protocol.

use super::{Document, DocumentError, DocumentSource, Element, Query};
use crate::config::Config;
use crate::engine::poll::Poller;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Key under which W3C drivers serialize element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const READY_STATE_POLL: Duration = Duration::from_millis(250);

/// Opens pages in a fresh WebDriver session.
#[derive(Debug, Clone)]
pub struct WebDriverSource {
    client: Client,
    base_url: String,
    headless: bool,
    navigation_timeout: Duration,
    idle_timeout: Duration,
}

impl WebDriverSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            headless: true,
            navigation_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(15),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            headless: config.headless,
            navigation_timeout: config.navigation_timeout,
            idle_timeout: config.network_idle_timeout,
            ..Self::new(config.webdriver_url.clone())
        }
    }

    fn capabilities(&self) -> Value {
        let mut args = vec!["--disable-gpu", "--no-sandbox"];
        if self.headless {
            args.push("--headless=new");
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    // Return once the DOM is parsed; rendering is awaited separately.
                    "pageLoadStrategy": "eager",
                    "timeouts": { "pageLoad": self.navigation_timeout.as_millis() as u64 },
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }

    async fn new_session(&self) -> Result<WebDriverDocument, DocumentError> {
        let url = format!("{}/session", self.base_url);
        let value = send(&self.client, Method::POST, &url, Some(self.capabilities())).await?;
        let session: NewSession = serde_json::from_value(value)
            .map_err(|e| DocumentError::Session(format!("unexpected new-session reply: {}", e)))?;
        debug!("Opened WebDriver session {}", session.session_id);

        Ok(WebDriverDocument {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.base_url, session.session_id),
        })
    }
}

#[async_trait]
impl DocumentSource for WebDriverSource {
    async fn open(&self, url: &str) -> Result<Box<dyn Document>, DocumentError> {
        let document = self.new_session().await?;

        info!("Navigating to vault page: {}", url);
        if let Err(e) = document.navigate(url).await {
            if let Err(close_err) = document.close().await {
                warn!("Failed to close browser session: {}", close_err);
            }
            return Err(e);
        }

        if !document.wait_until_loaded(self.idle_timeout).await {
            warn!("Network idle state not reached; continuing.");
        }

        Ok(Box::new(document))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct DriverFailure {
    error: String,
    #[serde(default)]
    message: String,
}

/// A page loaded in one WebDriver session.
#[derive(Debug, Clone)]
pub struct WebDriverDocument {
    client: Client,
    session_url: String,
}

impl WebDriverDocument {
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, DocumentError> {
        let url = format!("{}{}", self.session_url, path);
        send(&self.client, method, &url, body).await
    }

    async fn navigate(&self, url: &str) -> Result<(), DocumentError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    /// Poll `document.readyState` until it reports `complete`.
    ///
    /// Returns false if the page did not settle within `timeout`.
    async fn wait_until_loaded(&self, timeout: Duration) -> bool {
        Poller::new(timeout, READY_STATE_POLL)
            .run(|_| async {
                let state = self
                    .command(
                        Method::POST,
                        "/execute/sync",
                        Some(json!({ "script": "return document.readyState", "args": [] })),
                    )
                    .await?;
                Ok::<_, DocumentError>((state.as_str() == Some("complete")).then_some(()))
            })
            .await
            .is_ok()
    }
}

#[async_trait]
impl Document for WebDriverDocument {
    async fn query_all(
        &self,
        scope: Option<&Element>,
        query: &Query,
    ) -> Result<Vec<Element>, DocumentError> {
        let path = match scope {
            Some(element) => format!("/element/{}/elements", element.id()),
            None => "/elements".to_string(),
        };
        let locator = json!({ "using": "xpath", "value": query.to_xpath() });
        let value = self
            .command(Method::POST, &path, Some(locator))
            .await
            .map_err(|e| match e {
                DocumentError::Query { message, .. } => DocumentError::Query {
                    query: query.to_string(),
                    message,
                },
                other => other,
            })?;
        parse_elements(&value)
    }

    async fn inner_text(&self, element: &Element) -> Result<String, DocumentError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.id()), None)
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DocumentError::Protocol(format!("element text is not a string: {}", value)))
    }

    async fn close(&self) -> Result<(), DocumentError> {
        debug!("Closing WebDriver session {}", self.session_url);
        self.command(Method::DELETE, "", None).await.map(|_| ())
    }
}

/// Send one WebDriver command and unwrap its `value` member.
///
/// Connection failures and gateway errors are retried with exponential
/// backoff; driver-reported errors are returned immediately.
async fn send(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, DocumentError> {
    let backoff = ExponentialBackoff {
        max_elapsed_time: Some(Duration::from_secs(10)),
        ..Default::default()
    };

    retry(backoff, || async {
        let mut request = client.request(method.clone(), url);
        if let Some(body) = &body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| backoff::Error::transient(DocumentError::Network(e.to_string())))?;

        let status = response.status();
        let payload: Value = response.json().await.map_err(|e| {
            if status.is_server_error() {
                backoff::Error::transient(DocumentError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                })
            } else {
                backoff::Error::permanent(DocumentError::Protocol(e.to_string()))
            }
        })?;

        let value = payload.get("value").cloned().unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(value);
        }
        Err(backoff::Error::permanent(driver_error(status.as_u16(), value)))
    })
    .await
}

/// Map a WebDriver error payload onto [`DocumentError`].
fn driver_error(status: u16, value: Value) -> DocumentError {
    let failure = match serde_json::from_value::<DriverFailure>(value) {
        Ok(failure) => failure,
        Err(_) => {
            return DocumentError::Http {
                status,
                message: "unrecognized driver error".to_string(),
            }
        }
    };

    match failure.error.as_str() {
        "stale element reference" | "no such element" => {
            DocumentError::StaleElement(failure.message)
        }
        "invalid selector" | "invalid argument" => DocumentError::Query {
            query: String::new(),
            message: failure.message,
        },
        "invalid session id" | "session not created" => DocumentError::Session(failure.message),
        "timeout" | "script timeout" => DocumentError::Http {
            status,
            message: format!("timeout: {}", failure.message),
        },
        _ => DocumentError::Http {
            status,
            message: format!("{}: {}", failure.error, failure.message),
        },
    }
}

fn parse_elements(value: &Value) -> Result<Vec<Element>, DocumentError> {
    let items = value
        .as_array()
        .ok_or_else(|| DocumentError::Protocol("Expected array of elements".to_string()))?;

    items
        .iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(Element::new)
                .ok_or_else(|| DocumentError::Protocol(format!("Malformed element reference: {}", item)))
        })
        .collect()
}
