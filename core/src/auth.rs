use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Basic-auth token: `base64("{username}:{password}")`.
pub fn basic_token(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}

/// Header value for a stored token.
pub fn basic_authorization(token: &str) -> String {
    format!("Basic {token}")
}

/// Username encoded in a Basic token, for display only.
pub fn token_username(token: &str) -> Option<String> {
    let decoded = STANDARD.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    decoded
        .split_once(':')
        .map(|(username, _)| username.to_string())
}

#[cfg(test)]
mod tests {
    use super::{basic_authorization, basic_token, token_username};

    #[test]
    fn basic_token_matches_rfc7617_example() {
        assert_eq!(basic_token("Aladdin", "open sesame"), "QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn authorization_value_is_prefixed() {
        assert_eq!(basic_authorization("abc"), "Basic abc");
    }

    #[test]
    fn token_username_round_trips_and_rejects_garbage() {
        let token = basic_token("ops", "pa:ss");
        assert_eq!(token_username(&token), Some("ops".to_string()));
        assert_eq!(token_username("%%%"), None);
    }
}
