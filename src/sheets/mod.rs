//! Remote tabular adapter for the spreadsheet that acts as the sync hub.
//!
//! The spreadsheet holds a "Meals" sheet (one row per meal, columns A-L)
//! and a "Settings" sheet (key/value pairs). This module owns that layout:
//! the header contract, the row codec, and the bounded ranges. Transport
//! goes through the [`SheetsApi`] trait so the sync engine can be exercised
//! against an in-memory spreadsheet in tests.

mod adapter;
mod api;
mod http;

#[cfg(test)]
pub mod fake;

pub use adapter::{meal_to_row, RemoteMeal, SheetAdapter, MEALS_SHEET, SETTINGS_SHEET};
pub use api::SheetsApi;
pub use http::HttpSheetsApi;

use thiserror::Error;

/// Any network or API failure talking to the remote store.
///
/// The adapter never retries; retry policy belongs to whoever triggers the
/// sync round.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("remote API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("no credential available")]
    NoCredential,
}
