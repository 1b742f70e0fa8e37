mod auth_cmd;
mod config_cmd;
mod meal;
mod sheet_cmd;
mod sync_cmd;
mod target_cmd;

pub use auth_cmd::AuthCommand;
pub use config_cmd::ConfigCommand;
pub use meal::MealCommand;
pub use sheet_cmd::SheetCommand;
pub use sync_cmd::SyncCommand;
pub use target_cmd::TargetCommand;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::sheets::HttpSheetsApi;
use crate::sync::{SheetTarget, SyncEngine};

/// Builds a sync engine from the persisted session settings.
pub(crate) fn build_engine(config: &Config, pool: SqlitePool) -> SyncEngine<HttpSheetsApi> {
    let api = HttpSheetsApi::new(config.access_token.clone());
    let target = config.sheet.spreadsheet_id.clone().map(|id| SheetTarget {
        spreadsheet_id: id,
        name: config
            .sheet
            .spreadsheet_name
            .clone()
            .unwrap_or_else(|| "Google Sheets".to_string()),
    });
    SyncEngine::new(api, pool, target, config.targets, config.last_synced)
}

/// Persists engine-side session changes (sync stamp, merged targets) after
/// a round.
pub(crate) fn save_session(
    config: &Config,
    engine: &SyncEngine<HttpSheetsApi>,
) -> Result<(), crate::config::ConfigError> {
    let mut updated = config.clone();
    updated.last_synced = engine.last_synced();
    updated.targets = engine.targets();
    if let Some(target) = engine.target() {
        updated.sheet.spreadsheet_id = Some(target.spreadsheet_id.clone());
        updated.sheet.spreadsheet_name = Some(target.name.clone());
    }
    updated.save()?;
    Ok(())
}
