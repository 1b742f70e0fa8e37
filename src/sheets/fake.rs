//! In-memory spreadsheet backend for adapter and sync-engine tests.
//!
//! Implements just enough A1-notation range semantics for the ranges the
//! adapter uses. Clones share state, so two "devices" can sync through the
//! same fake spreadsheet.

use std::sync::{Arc, Mutex};

use super::api::SheetsApi;
use super::RemoteError;

type Grid = Vec<Vec<String>>;

#[derive(Clone)]
pub struct FakeSheets {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    spreadsheets: Vec<(String, Vec<(String, Grid)>)>,
    next_id: u32,
    fail_requests: bool,
    fail_reads: bool,
    has_credential: bool,
}

/// Zero-based, end-inclusive rectangle within one sheet.
struct RangeRef {
    sheet: String,
    start_row: usize,
    start_col: usize,
    end_row: usize,
    end_col: usize,
}

fn parse_cell(s: &str) -> (usize, usize) {
    let letters: String = s.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = s.chars().skip_while(|c| c.is_ascii_alphabetic()).collect();

    let mut col = 0usize;
    for c in letters.chars() {
        col = col * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    let row: usize = digits.parse().expect("cell reference needs a row number");
    (row - 1, col - 1)
}

fn parse_range(range: &str) -> RangeRef {
    let (sheet, cells) = range.split_once('!').expect("range needs a sheet prefix");
    match cells.split_once(':') {
        Some((start, end)) => {
            let (start_row, start_col) = parse_cell(start);
            let (end_row, end_col) = parse_cell(end);
            RangeRef {
                sheet: sheet.to_string(),
                start_row,
                start_col,
                end_row,
                end_col,
            }
        }
        None => {
            // A bare start cell opens an unbounded write region.
            let (start_row, start_col) = parse_cell(cells);
            RangeRef {
                sheet: sheet.to_string(),
                start_row,
                start_col,
                end_row: usize::MAX,
                end_col: usize::MAX,
            }
        }
    }
}

impl FakeSheets {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                spreadsheets: Vec::new(),
                next_id: 0,
                fail_requests: false,
                fail_reads: false,
                has_credential: true,
            })),
        }
    }

    /// Every subsequent request fails with a 503 until reset.
    pub fn fail_requests(&self, fail: bool) {
        self.inner.lock().unwrap().fail_requests = fail;
    }

    /// Only value reads fail; writes still succeed.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    pub fn set_credential(&self, present: bool) {
        self.inner.lock().unwrap().has_credential = present;
    }

    fn check_up(inner: &Inner) -> Result<(), RemoteError> {
        if inner.fail_requests {
            return Err(RemoteError::Api {
                status: 503,
                message: "backend unavailable (test)".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for FakeSheets {
    fn default() -> Self {
        Self::new()
    }
}

fn grid_mut<'a>(
    inner: &'a mut Inner,
    spreadsheet_id: &str,
    sheet: &str,
) -> Result<&'a mut Grid, RemoteError> {
    let not_found = |what: &str| RemoteError::Api {
        status: 404,
        message: format!("{} not found", what),
    };

    let sheets = inner
        .spreadsheets
        .iter_mut()
        .find(|(id, _)| id == spreadsheet_id)
        .map(|(_, sheets)| sheets)
        .ok_or_else(|| not_found("spreadsheet"))?;
    sheets
        .iter_mut()
        .find(|(title, _)| title == sheet)
        .map(|(_, grid)| grid)
        .ok_or_else(|| not_found("sheet"))
}

impl SheetsApi for FakeSheets {
    fn has_credential(&self) -> bool {
        self.inner.lock().unwrap().has_credential
    }

    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_up(&inner)?;
        if inner.fail_reads {
            return Err(RemoteError::Api {
                status: 503,
                message: "read unavailable (test)".to_string(),
            });
        }

        let r = parse_range(range);
        let grid = grid_mut(&mut inner, spreadsheet_id, &r.sheet)?;

        let width = r.end_col.saturating_sub(r.start_col).saturating_add(1);
        let mut out = Vec::new();
        for row_idx in r.start_row..=r.end_row.min(grid.len().saturating_sub(1)) {
            let Some(row) = grid.get(row_idx) else { break };
            let cells: Vec<String> = row.iter().skip(r.start_col).take(width).cloned().collect();
            out.push(cells);
        }

        // The real API omits trailing blank rows.
        while out
            .last()
            .is_some_and(|row| row.iter().all(|c| c.is_empty()))
        {
            out.pop();
        }
        Ok(out)
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_up(&inner)?;

        let r = parse_range(range);
        let grid = grid_mut(&mut inner, spreadsheet_id, &r.sheet)?;

        for (i, row) in values.iter().enumerate() {
            let row_idx = r.start_row + i;
            while grid.len() <= row_idx {
                grid.push(Vec::new());
            }
            let target = &mut grid[row_idx];
            for (j, cell) in row.iter().enumerate() {
                let col_idx = r.start_col + j;
                while target.len() <= col_idx {
                    target.push(String::new());
                }
                target[col_idx] = cell.clone();
            }
        }
        Ok(())
    }

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_up(&inner)?;

        let r = parse_range(range);
        let grid = grid_mut(&mut inner, spreadsheet_id, &r.sheet)?;

        for row_idx in r.start_row..=r.end_row.min(grid.len().saturating_sub(1)) {
            let Some(row) = grid.get_mut(row_idx) else { break };
            for col_idx in r.start_col..=r.end_col.min(row.len().saturating_sub(1)) {
                if let Some(cell) = row.get_mut(col_idx) {
                    cell.clear();
                }
            }
        }
        Ok(())
    }

    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, RemoteError> {
        let inner = self.inner.lock().unwrap();
        Self::check_up(&inner)?;

        inner
            .spreadsheets
            .iter()
            .find(|(id, _)| id == spreadsheet_id)
            .map(|(_, sheets)| sheets.iter().map(|(title, _)| title.clone()).collect())
            .ok_or_else(|| RemoteError::Api {
                status: 404,
                message: "spreadsheet not found".to_string(),
            })
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_up(&inner)?;

        let sheets = inner
            .spreadsheets
            .iter_mut()
            .find(|(id, _)| id == spreadsheet_id)
            .map(|(_, sheets)| sheets)
            .ok_or_else(|| RemoteError::Api {
                status: 404,
                message: "spreadsheet not found".to_string(),
            })?;

        if sheets.iter().any(|(t, _)| t == title) {
            return Err(RemoteError::Api {
                status: 400,
                message: format!("sheet '{}' already exists", title),
            });
        }
        sheets.push((title.to_string(), Vec::new()));
        Ok(())
    }

    async fn create_spreadsheet(
        &self,
        _title: &str,
        sheet_title: &str,
    ) -> Result<String, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_up(&inner)?;

        inner.next_id += 1;
        let id = format!("fake-spreadsheet-{}", inner.next_id);
        inner
            .spreadsheets
            .push((id.clone(), vec![(sheet_title.to_string(), Vec::new())]));
        Ok(id)
    }
}
