use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use crate::constants::{SHEETS_API_BASE, SHEETS_SCOPE};
use crate::error::LoadError;
use crate::load::google_auth::{self, ServiceAccountKey};
use crate::load::{ensure_not_empty, require, Sink};
use crate::types::{CleanRecord, COLUMNS};

/// How the sink obtains its bearer token
#[derive(Debug, Clone)]
pub enum SheetsAuth {
    /// A token issued elsewhere, used as is
    AccessToken(String),
    /// Service account JSON key, signed in on every save
    ServiceAccount(PathBuf),
}

/// Overwrites a spreadsheet range through the Google Sheets values API.
pub struct SheetsSink {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    range: String,
    auth: SheetsAuth,
}

impl SheetsSink {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
        auth: SheetsAuth,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
            auth,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> Result<Url, LoadError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| LoadError::InvalidArgument(format!("Sheets API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| LoadError::InvalidArgument("Sheets API base cannot hold a path".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", self.range.as_str()]);
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        Ok(url)
    }

    async fn access_token(&self) -> Result<String, LoadError> {
        match &self.auth {
            SheetsAuth::AccessToken(token) => {
                require(token, "Access token")?;
                Ok(token.clone())
            }
            SheetsAuth::ServiceAccount(path) => {
                let key = ServiceAccountKey::from_file(path).await?;
                google_auth::fetch_access_token(&self.client, &key, SHEETS_SCOPE).await
            }
        }
    }
}

/// Header row followed by one row per record
pub fn sheet_values(records: &[CleanRecord]) -> Vec<Vec<Value>> {
    let mut values = Vec::with_capacity(records.len() + 1);
    values.push(COLUMNS.iter().map(|c| json!(c)).collect());
    values.extend(records.iter().map(|r| {
        vec![
            json!(r.title),
            json!(r.price),
            json!(r.rating),
            json!(r.colors),
            json!(r.size),
            json!(r.gender),
            json!(r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]
    }));
    values
}

#[async_trait]
impl Sink for SheetsSink {
    fn name(&self) -> &'static str {
        "google_sheets"
    }

    async fn save(&self, records: &[CleanRecord]) -> Result<String, LoadError> {
        ensure_not_empty(records)?;
        require(&self.spreadsheet_id, "Spreadsheet ID")?;
        require(&self.range, "Range name")?;
        let url = self.endpoint()?;
        let access_token = self.access_token().await?;
        debug!("Updating sheet range via {}", url);

        let response = self
            .client
            .put(url)
            .bearer_auth(&access_token)
            .json(&json!({ "values": sheet_values(records) }))
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

        let result: Value = response.json().await?;
        let updated = result
            .get("updatedRange")
            .and_then(Value::as_str)
            .unwrap_or(self.range.as_str())
            .to_string();
        info!("Successfully saved data to Google Sheets: {}", updated);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{header, method, path, query_param};
    use tempfile::tempdir;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token(value: &str) -> SheetsAuth {
        SheetsAuth::AccessToken(value.to_string())
    }

    fn record() -> CleanRecord {
        CleanRecord {
            title: "Pants 7".to_string(),
            price: 80.5,
            rating: 4,
            colors: 3.0,
            size: "XL".to_string(),
            gender: "Men".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 5).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_puts_header_and_rows() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A1"))
            .and(query_param("valueInputOption", "RAW"))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "updatedRange": "Sheet1!A1:G2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sink = SheetsSink::new("sheet-123", "Sheet1!A1", token("token-abc")).with_api_base(server.uri());
        let updated = sink.save(&[record()]).await.unwrap();
        assert_eq!(updated, "Sheet1!A1:G2");

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body["values"],
            json!([
                ["Title", "Price", "Rating", "Colors", "Size", "Gender", "Timestamp"],
                ["Pants 7", 80.5, 4, 3.0, "XL", "Men", "2025-03-01 09:30:05"]
            ])
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let sink = SheetsSink::new("sheet-123", "Sheet1!A1", token("bad")).with_api_base(server.uri());
        match sink.save(&[record()]).await {
            Err(LoadError::Remote { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_parameters_are_rejected() {
        for sink in [
            SheetsSink::new("", "Sheet1!A1", token("token")),
            SheetsSink::new("sheet-123", "Sheet1!A1", token("")),
        ] {
            assert!(matches!(
                sink.save(&[record()]).await,
                Err(LoadError::InvalidArgument(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_service_account_signs_in_before_writing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.from-key",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A1"))
            .and(header("authorization", "Bearer ya29.from-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "updatedRange": "Sheet1!A1:G2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let key_path = dir.path().join("service_account.json");
        std::fs::write(
            &key_path,
            json!({
                "type": "service_account",
                "client_email": "etl@catalog-test.iam.gserviceaccount.com",
                "private_key": include_str!("../../tests/fixtures/service_account_key.pem"),
                "token_uri": format!("{}/token", server.uri()),
            })
            .to_string(),
        )
        .unwrap();

        let sink = SheetsSink::new("sheet-123", "Sheet1!A1", SheetsAuth::ServiceAccount(key_path))
            .with_api_base(server.uri());
        assert_eq!(sink.save(&[record()]).await.unwrap(), "Sheet1!A1:G2");
    }

    #[tokio::test]
    async fn test_missing_key_file_fails_without_writing() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let sink = SheetsSink::new(
            "sheet-123",
            "Sheet1!A1",
            SheetsAuth::ServiceAccount(PathBuf::from("/no/such/key.json")),
        )
        .with_api_base(server.uri());
        assert!(matches!(
            sink.save(&[record()]).await,
            Err(LoadError::Credentials { .. })
        ));
    }
}
