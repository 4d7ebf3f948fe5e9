use agentdash_core::auth::{basic_token, token_username};
use serde_json::json;

use crate::util::{
    StoredCredentials, credentials_path, fetch_json, load_credentials, print_json,
    save_credentials,
};

/// Check credentials against the API and store the Basic token on success.
pub async fn login(api_url: &str, username: &str, password: &str) -> i32 {
    let body = json!({"username": username, "password": password});
    if let Err(failure) = fetch_json(
        api_url,
        reqwest::Method::POST,
        &["api", "auth"],
        None,
        Some(&body),
    )
    .await
    {
        return failure.report();
    }

    let creds = StoredCredentials {
        api_url: api_url.to_string(),
        username: username.to_string(),
        token: basic_token(username, password),
        saved_at: chrono::Utc::now(),
    };
    let path = credentials_path();
    if let Err(e) = save_credentials(&path, &creds) {
        crate::util::exit_error(
            &format!("Authenticated, but failed to store credentials: {e}"),
            Some("Check permissions on the config directory."),
        );
    }

    print_json(&json!({
        "status": "authenticated",
        "username": creds.username,
        "credentials_path": path.to_string_lossy()
    }));
    0
}

pub fn logout() -> Result<(), Box<dyn std::error::Error>> {
    let path = credentials_path();
    let username = load_credentials(&path).and_then(|c| token_username(&c.token));
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    print_json(&json!({
        "status": "logged_out",
        "username": username,
        "credentials_path": path.to_string_lossy()
    }));
    Ok(())
}
