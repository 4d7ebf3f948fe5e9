use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Stored credentials for the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub api_url: String,
    pub username: String,
    /// `base64(username:password)`, sent as `Authorization: Basic <token>`
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

pub fn eprint_json(value: &serde_json::Value) {
    eprintln!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprint_json(&err);
    std::process::exit(1);
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentdash")
}

pub fn credentials_path() -> PathBuf {
    config_dir().join("credentials.json")
}

pub fn load_credentials(path: &Path) -> Option<StoredCredentials> {
    let data = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn save_credentials(
    path: &Path,
    creds: &StoredCredentials,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = serde_json::to_string_pretty(creds)?;
    write_private(path, data.as_bytes())?;
    Ok(())
}

/// Write a file readable only by the current user (0o600 on unix).
pub fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(data)?;
    Ok(())
}

/// Resolve the `Authorization` header value for API requests (priority order):
/// 1. AGENTDASH_TOKEN env var (the base64 Basic token)
/// 2. ~/.config/agentdash/credentials.json
/// 3. Error
pub fn resolve_authorization(api_url: &str) -> Result<String, Box<dyn std::error::Error>> {
    if let Ok(token) = std::env::var("AGENTDASH_TOKEN") {
        return Ok(agentdash_core::auth::basic_authorization(&token));
    }

    if let Some(creds) = load_credentials(&credentials_path()) {
        if creds.api_url != api_url {
            tracing::warn!(
                stored = %creds.api_url,
                requested = %api_url,
                "stored credentials were issued for a different API URL"
            );
        }
        return Ok(agentdash_core::auth::basic_authorization(&creds.token));
    }

    Err("No credentials found. Run `agentdash login` or set AGENTDASH_TOKEN.".into())
}

/// Map an HTTP status to the CLI exit code convention.
///
/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub fn exit_code_for_status(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

pub fn connection_error(e: impl std::fmt::Display) -> serde_json::Value {
    json!({
        "error": "connection_error",
        "message": format!("{e}"),
        "docs_hint": "Is the API server running? Check AGENTDASH_API_URL."
    })
}

/// Append `segments` to the API base URL, escaping each one so ids can never
/// address a different route.
fn build_url(api_url: &str, segments: &[&str]) -> Result<url::Url, serde_json::Value> {
    let invalid = |detail: String| {
        json!({
            "error": "cli_error",
            "message": format!("Invalid URL: {api_url}: {detail}")
        })
    };
    let mut url = url::Url::parse(api_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("cannot be a base URL".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Failed request: the exit code and the JSON to print on stderr.
#[derive(Debug)]
pub struct Failure {
    pub code: i32,
    pub body: serde_json::Value,
}

impl Failure {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            code: 4,
            body: json!({"error": "cli_error", "message": message.into()}),
        }
    }

    pub fn report(self) -> i32 {
        eprint_json(&self.body);
        self.code
    }
}

/// Execute an API request and return the decoded JSON body of a 2xx response.
pub async fn fetch_json(
    api_url: &str,
    method: reqwest::Method,
    path: &[&str],
    authorization: Option<&str>,
    body: Option<&serde_json::Value>,
) -> Result<serde_json::Value, Failure> {
    let url = build_url(api_url, path).map_err(|body| Failure { code: 4, body })?;

    let mut req = client().request(method, url);
    if let Some(value) = authorization {
        req = req.header("Authorization", value);
    }
    if let Some(b) = body {
        req = req.json(b);
    }

    let resp = req.send().await.map_err(|e| Failure {
        code: 3,
        body: connection_error(e),
    })?;

    let status = resp.status().as_u16();
    let resp_body: serde_json::Value = match resp.json().await {
        Ok(v) => v,
        Err(e) => json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
    };

    match exit_code_for_status(status) {
        0 => Ok(resp_body),
        code => Err(Failure {
            code,
            body: resp_body,
        }),
    }
}

/// Execute an API request, print the response, return the structured exit code.
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &[&str],
    authorization: Option<&str>,
    body: Option<serde_json::Value>,
) -> i32 {
    match fetch_json(api_url, method, path, authorization, body.as_ref()).await {
        Ok(value) => {
            print_json(&value);
            0
        }
        Err(failure) => failure.report(),
    }
}

// Unix-specific imports for file permissions
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

// No-op on non-unix (won't compile for Windows without this)
#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}
