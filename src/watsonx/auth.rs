//! IBM Cloud IAM token exchange with an in-memory token cache.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

const GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Tokens are refreshed this long before IAM says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Exchanges an API key for bearer tokens, reusing a token until it nears expiry.
pub struct IamAuthenticator {
    token_url: String,
    api_key: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for IamAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthenticator")
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl IamAuthenticator {
    pub fn new(iam_url: &str, api_key: &str, http: reqwest::Client) -> Self {
        Self {
            token_url: format!("{}/identity/token", iam_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            http,
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a new one when none is cached or it is stale.
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
            debug!("IAM token is about to expire, refreshing");
        }

        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn request_token(&self) -> Result<CachedToken> {
        debug!("Requesting IAM token from {}", self.token_url);

        let resp = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", GRANT_TYPE),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::from_transport("IAM token request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            // IAM answers 400 for unknown or revoked keys.
            if status == reqwest::StatusCode::BAD_REQUEST {
                return Err(Error::Auth(format!(
                    "IAM rejected API key ({status}): {body}"
                )));
            }
            return Err(Error::from_status(status, body));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| Error::from_transport("unreadable IAM token response", e))?;

        let lifetime = Duration::from_secs(body.expires_in)
            .saturating_sub(EXPIRY_MARGIN);
        Ok(CachedToken {
            access_token: body.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn token_is_fetched_once_and_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/identity/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("apikey".into(), "key-123".into()),
                Matcher::UrlEncoded("grant_type".into(), GRANT_TYPE.into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"tok-1","token_type":"Bearer","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let auth = IamAuthenticator::new(&server.url(), "key-123", reqwest::Client::new());
        assert_eq!(auth.token().await.unwrap(), "tok-1");
        assert_eq!(auth.token().await.unwrap(), "tok-1");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn short_lived_token_is_refreshed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/identity/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","expires_in":30}"#)
            .expect(2)
            .create_async()
            .await;

        let auth = IamAuthenticator::new(&server.url(), "key", reqwest::Client::new());
        auth.token().await.unwrap();
        auth.token().await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_key_is_an_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/identity/token")
            .with_status(400)
            .with_body(
                r#"{"errorCode":"BXNIM0415E","errorMessage":"Provided API key could not be found."}"#,
            )
            .create_async()
            .await;

        let auth = IamAuthenticator::new(&server.url(), "bad", reqwest::Client::new());
        let err = auth.token().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "{err}");
    }

    #[tokio::test]
    async fn unauthorized_and_forbidden_are_auth_errors() {
        for status in [401, 403] {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("POST", "/identity/token")
                .with_status(status)
                .with_body("denied")
                .create_async()
                .await;

            let auth = IamAuthenticator::new(&server.url(), "key", reqwest::Client::new());
            let err = auth.token().await.unwrap_err();
            assert!(matches!(err, Error::Auth(_)), "{status}: {err}");
        }
    }

    #[tokio::test]
    async fn undecodable_token_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/identity/token")
            .with_status(200)
            .with_body("<html>proxy</html>")
            .create_async()
            .await;

        let auth = IamAuthenticator::new(&server.url(), "key", reqwest::Client::new());
        let err = auth.token().await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)), "{err}");
    }

    #[tokio::test]
    async fn unreachable_iam_is_a_network_error() {
        let auth = IamAuthenticator::new("http://127.0.0.1:1", "key", reqwest::Client::new());
        let err = auth.token().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)), "{err}");
    }
}
