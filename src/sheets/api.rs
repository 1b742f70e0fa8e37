use super::RemoteError;

/// Range-based access to a spreadsheet backend.
///
/// Mirrors the handful of Google Sheets v4 calls the app needs. Values are
/// plain strings both ways; the adapter layer owns parsing.
#[allow(async_fn_in_trait)]
pub trait SheetsApi {
    /// Whether a bearer credential is available for requests.
    fn has_credential(&self) -> bool;

    /// Reads a bounded range. Missing trailing rows and cells are simply
    /// absent from the result.
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, RemoteError>;

    /// Writes rows starting at the top-left cell of `range`.
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), RemoteError>;

    /// Blanks every cell in `range`.
    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<(), RemoteError>;

    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, RemoteError>;

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<(), RemoteError>;

    /// Creates a spreadsheet containing a single named sheet and returns
    /// the new spreadsheet id.
    async fn create_spreadsheet(
        &self,
        title: &str,
        sheet_title: &str,
    ) -> Result<String, RemoteError>;
}
