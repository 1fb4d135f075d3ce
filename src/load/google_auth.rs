//! Service account sign-in for Google APIs.
//!
//! A signed RS256 assertion built from the key file is exchanged at the key's
//! `token_uri` for a short-lived bearer token.

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{GOOGLE_TOKEN_URI, SERVICE_ACCOUNT_TOKEN_SECS};
use crate::error::LoadError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The fields of a downloaded service account JSON key that sign-in needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub async fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Credentials {
                    path: path.display().to_string(),
                    source,
                })?;
        serde_json::from_str(&content).map_err(|e| LoadError::InvalidCredentials(e.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn sign_assertion(key: &ServiceAccountKey, scope: &str) -> Result<String, LoadError> {
    let now = Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: scope.to_string(),
        aud: key.token_uri.clone(),
        iat: now,
        exp: now + SERVICE_ACCOUNT_TOKEN_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&header, &claims, &signing_key)?)
}

/// Exchanges a signed assertion for an access token covering `scope`.
pub async fn fetch_access_token(
    client: &Client,
    key: &ServiceAccountKey,
    scope: &str,
) -> Result<String, LoadError> {
    let assertion = sign_assertion(key, scope)?;
    debug!("Requesting access token for {} from {}", key.client_email, key.token_uri);

    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LoadError::Remote {
            status: status.as_u16(),
            body,
        });
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SHEETS_SCOPE;
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/service_account_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/service_account_pub.pem");

    fn key(token_uri: String) -> ServiceAccountKey {
        ServiceAccountKey {
            client_email: "etl@catalog-test.iam.gserviceaccount.com".to_string(),
            private_key: PRIVATE_KEY.to_string(),
            private_key_id: Some("key-1".to_string()),
            token_uri,
        }
    }

    #[tokio::test]
    async fn test_exchanges_signed_assertion_for_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.sheets",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token_uri = format!("{}/token", server.uri());
        let token = fetch_access_token(&Client::new(), &key(token_uri.clone()), SHEETS_SCOPE)
            .await
            .unwrap();
        assert_eq!(token, "ya29.sheets");

        let requests = server.received_requests().await.unwrap();
        let form: Vec<(String, String)> = url::form_urlencoded::parse(&requests[0].body)
            .into_owned()
            .collect();
        assert_eq!(form[0], ("grant_type".to_string(), JWT_BEARER_GRANT.to_string()));
        assert_eq!(form[1].0, "assertion");

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[token_uri.as_str()]);
        let decoded = decode::<AssertionClaims>(
            &form[1].1,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();
        assert_eq!(decoded.header.kid.as_deref(), Some("key-1"));
        assert_eq!(decoded.claims.iss, "etl@catalog-test.iam.gserviceaccount.com");
        assert_eq!(decoded.claims.scope, SHEETS_SCOPE);
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
    }

    #[tokio::test]
    async fn test_rejected_assertion_is_a_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let result =
            fetch_access_token(&Client::new(), &key(format!("{}/token", server.uri())), SHEETS_SCOPE)
                .await;
        match result {
            Err(LoadError::Remote { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid_grant");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_key_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        std::fs::write(
            &path,
            json!({
                "type": "service_account",
                "client_email": "etl@catalog-test.iam.gserviceaccount.com",
                "private_key": PRIVATE_KEY,
            })
            .to_string(),
        )
        .unwrap();

        let key = ServiceAccountKey::from_file(&path).await.unwrap();
        assert_eq!(key.token_uri, GOOGLE_TOKEN_URI);
        assert!(key.private_key_id.is_none());

        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            ServiceAccountKey::from_file(&path).await,
            Err(LoadError::InvalidCredentials(_))
        ));
        assert!(matches!(
            ServiceAccountKey::from_file(&dir.path().join("missing.json")).await,
            Err(LoadError::Credentials { .. })
        ));
    }

    #[test]
    fn test_malformed_private_key_is_a_signing_error() {
        let mut bad = key(GOOGLE_TOKEN_URI.to_string());
        bad.private_key = "not a pem".to_string();
        assert!(matches!(
            sign_assertion(&bad, SHEETS_SCOPE),
            Err(LoadError::Jwt(_))
        ));
    }
}
