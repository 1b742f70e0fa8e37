use serde::Deserialize;
use serde_json::json;

use super::api::SheetsApi;
use super::RemoteError;

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Google Sheets v4 client over REST with a cached bearer token.
///
/// The token comes from an external OAuth flow; this client only carries it.
pub struct HttpSheetsApi {
    client: reqwest::Client,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct SpreadsheetResponse {
    #[serde(rename = "spreadsheetId")]
    spreadsheet_id: String,
}

#[derive(Deserialize)]
struct SheetListResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

impl HttpSheetsApi {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    fn token(&self) -> Result<&str, RemoteError> {
        self.token.as_deref().ok_or(RemoteError::NoCredential)
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_BASE,
            spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Cells come back as strings under FORMATTED_VALUE, but numbers typed by
/// hand into the sheet can arrive as JSON numbers.
fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

impl SheetsApi for HttpSheetsApi {
    fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, RemoteError> {
        let response = self
            .client
            .get(self.values_url(spreadsheet_id, range))
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let body: ValuesResponse = Self::check(response).await?.json().await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), RemoteError> {
        let url = format!(
            "{}?valueInputOption=RAW",
            self.values_url(spreadsheet_id, range)
        );
        let response = self
            .client
            .put(url)
            .bearer_auth(self.token()?)
            .json(&json!({ "values": values }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<(), RemoteError> {
        let url = format!("{}:clear", self.values_url(spreadsheet_id, range));
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token()?)
            .json(&json!({}))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, RemoteError> {
        let url = format!(
            "{}/{}?fields=sheets.properties.title",
            SHEETS_BASE, spreadsheet_id
        );
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let body: SheetListResponse = Self::check(response).await?.json().await?;

        Ok(body
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<(), RemoteError> {
        let url = format!("{}/{}:batchUpdate", SHEETS_BASE, spreadsheet_id);
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn create_spreadsheet(
        &self,
        title: &str,
        sheet_title: &str,
    ) -> Result<String, RemoteError> {
        let body = json!({
            "properties": { "title": title },
            "sheets": [{ "properties": { "title": sheet_title } }]
        });
        let response = self
            .client
            .post(SHEETS_BASE)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;
        let created: SpreadsheetResponse = Self::check(response).await?.json().await?;
        Ok(created.spreadsheet_id)
    }
}
