use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::conflict::{Conflict, ConflictChoice, PendingSync, Resolution};
use super::SyncError;
use crate::db::MealRepository;
use crate::models::{MacroTargets, Meal, NewMeal};
use crate::sheets::{RemoteMeal, SheetAdapter, SheetsApi, MEALS_SHEET};

/// The linked spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetTarget {
    pub spreadsheet_id: String,
    pub name: String,
}

/// Engine states. A sync request arriving while not idle is dropped, not
/// queued.
enum SyncState {
    Idle,
    Syncing,
    AwaitingResolution(PendingSync),
}

/// What the status line shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Hidden,
    Syncing,
    Synced { sheet: Option<String> },
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadySyncing,
    NoTarget,
    NotAuthenticated,
}

/// Result of one triggered sync round.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The round never started; see the reason.
    Skipped(SkipReason),
    /// The round is suspended on conflicts; resume with `resolve` or
    /// `cancel`.
    ConflictsPending { conflicts: usize },
    Completed(MergeReport),
}

#[derive(Debug, Clone)]
pub struct MergeReport {
    /// Records imported from the spreadsheet this round.
    pub imported: usize,
    /// Total records pushed back.
    pub pushed: usize,
    /// Targets after the settings piggyback.
    pub targets: MacroTargets,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum LoadOutcome {
    /// The spreadsheet had no data rows; the local store was not touched.
    EmptyRemote,
    Loaded { imported: usize },
}

/// Orchestrates pull, diff, conflict detection, merge and push between the
/// local store and the spreadsheet.
///
/// All session state the sync needs (credential-backed API handle, linked
/// target, last-sync stamp, daily targets) lives on this object; nothing is
/// ambient.
pub struct SyncEngine<A: SheetsApi> {
    api: A,
    pool: SqlitePool,
    target: Option<SheetTarget>,
    targets: MacroTargets,
    last_synced: Option<DateTime<Utc>>,
    state: SyncState,
    status: SyncStatus,
}

fn content_matches(local: &Meal, remote: &RemoteMeal) -> bool {
    local.name == remote.name
        && local.meal_type == remote.meal_type
        && local.date == remote.date
        && local.calories == remote.calories
        && local.protein == remote.protein
        && local.carbs == remote.carbs
        && local.fat == remote.fat
        && local.sugar == remote.sugar
        && local.notes == remote.notes
}

fn import_draft(remote: &RemoteMeal, sync_id: &str) -> NewMeal {
    NewMeal::new(remote.date, remote.name.clone(), remote.meal_type)
        .with_macros(remote.protein, remote.carbs, remote.fat, remote.sugar)
        .with_calories(remote.calories)
        .with_notes(remote.notes.clone())
        .with_sync_identity(sync_id, remote.modified_at)
}

impl<A: SheetsApi> SyncEngine<A> {
    pub fn new(
        api: A,
        pool: SqlitePool,
        target: Option<SheetTarget>,
        targets: MacroTargets,
        last_synced: Option<DateTime<Utc>>,
    ) -> Self {
        let status = match &target {
            Some(t) => SyncStatus::Synced {
                sheet: Some(t.name.clone()),
            },
            None => SyncStatus::Hidden,
        };
        Self {
            api,
            pool,
            target,
            targets,
            last_synced,
            state: SyncState::Idle,
            status,
        }
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn target(&self) -> Option<&SheetTarget> {
        self.target.as_ref()
    }

    pub fn targets(&self) -> MacroTargets {
        self.targets
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.last_synced
    }

    /// The suspended partitions, if a round is awaiting resolution.
    pub fn pending(&self) -> Option<&PendingSync> {
        match &self.state {
            SyncState::AwaitingResolution(pending) => Some(pending),
            _ => None,
        }
    }

    /// One identity-based merge round. Pulls both sides, partitions by sync
    /// id, and either merges directly or suspends on conflicts.
    pub async fn smart_sync(&mut self) -> Result<SyncOutcome, SyncError> {
        if !matches!(self.state, SyncState::Idle) {
            tracing::debug!("Sync already in progress, dropping request");
            return Ok(SyncOutcome::Skipped(SkipReason::AlreadySyncing));
        }
        let Some(target) = self.target.clone() else {
            return Ok(SyncOutcome::Skipped(SkipReason::NoTarget));
        };
        if !self.api.has_credential() {
            return Ok(SyncOutcome::Skipped(SkipReason::NotAuthenticated));
        }

        self.state = SyncState::Syncing;
        self.status = SyncStatus::Syncing;

        match self.run_round(&target).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.state = SyncState::Idle;
                self.status = SyncStatus::Error;
                Err(e)
            }
        }
    }

    async fn run_round(&mut self, target: &SheetTarget) -> Result<SyncOutcome, SyncError> {
        let repo = MealRepository::new(self.pool.clone());
        let local_meals = repo.get_all().await?;

        let adapter = SheetAdapter::new(&self.api, &target.spreadsheet_id);
        let remote_meals = match adapter.fetch_rows().await {
            Ok(rows) => rows,
            Err(e) if self.last_synced.is_none() => {
                // A target that has never synced may not have data yet.
                tracing::debug!("Fetch failed on fresh target, assuming empty remote: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut local_by_sync_id: HashMap<String, Meal> = HashMap::new();
        let mut local_without_sync_id = Vec::new();
        for meal in local_meals {
            match meal.sync_id.clone() {
                Some(id) => {
                    local_by_sync_id.insert(id, meal);
                }
                None => local_without_sync_id.push(meal),
            }
        }

        // Rows without a sync id cannot participate in an identity merge.
        let remote_by_sync_id: BTreeMap<String, RemoteMeal> = remote_meals
            .into_iter()
            .filter_map(|m| m.sync_id.clone().map(|id| (id, m)))
            .collect();

        let mut conflicts = Vec::new();
        let mut new_from_remote = Vec::new();
        for (sync_id, remote) in &remote_by_sync_id {
            match local_by_sync_id.get(sync_id) {
                Some(local) => {
                    // A conflict needs both differing content and differing
                    // stamps; either alone means an already-synced pair.
                    if !content_matches(local, remote) && local.modified_at != remote.modified_at {
                        conflicts.push(Conflict {
                            sync_id: sync_id.clone(),
                            local: local.clone(),
                            remote: remote.clone(),
                        });
                    }
                }
                None => new_from_remote.push(remote.clone()),
            }
        }

        let mut local_only: Vec<Meal> = local_by_sync_id
            .values()
            .filter(|meal| {
                meal.sync_id
                    .as_ref()
                    .is_some_and(|id| !remote_by_sync_id.contains_key(id))
            })
            .cloned()
            .collect();
        local_only.sort_by_key(|m| m.id);
        local_only.extend(local_without_sync_id);

        if !conflicts.is_empty() {
            tracing::debug!("{} conflict(s) need a decision", conflicts.len());
            let count = conflicts.len();
            self.state = SyncState::AwaitingResolution(PendingSync {
                conflicts,
                new_from_remote,
                local_only,
            });
            return Ok(SyncOutcome::ConflictsPending { conflicts: count });
        }

        self.perform_merge(target, new_from_remote, Vec::new())
            .await
            .map(SyncOutcome::Completed)
    }

    /// Resumes a suspended round with the caller's decisions.
    pub async fn resolve(
        &mut self,
        choices: &HashMap<String, ConflictChoice>,
    ) -> Result<MergeReport, SyncError> {
        let pending = match std::mem::replace(&mut self.state, SyncState::Syncing) {
            SyncState::AwaitingResolution(pending) => pending,
            other => {
                self.state = other;
                return Err(SyncError::NoPendingResolution);
            }
        };
        let Some(target) = self.target.clone() else {
            self.state = SyncState::Idle;
            return Err(SyncError::NoTarget);
        };

        let (resolutions, new_from_remote) = pending.resolve(choices);
        match self.perform_merge(&target, new_from_remote, resolutions).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.state = SyncState::Idle;
                self.status = SyncStatus::Error;
                Err(e)
            }
        }
    }

    /// Abandons a suspended round. Local data is untouched and the round is
    /// simply skipped; canceling is not an error state.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            SyncState::AwaitingResolution(_) => {
                self.state = SyncState::Idle;
                self.status = SyncStatus::Synced {
                    sheet: self.target.as_ref().map(|t| t.name.clone()),
                };
                true
            }
            _ => false,
        }
    }

    /// Import, backfill, apply resolutions, sync targets, push. Not
    /// transactional across steps: a failure leaves already-committed local
    /// writes in place and the next round converges.
    async fn perform_merge(
        &mut self,
        target: &SheetTarget,
        new_from_remote: Vec<RemoteMeal>,
        resolutions: Vec<Resolution>,
    ) -> Result<MergeReport, SyncError> {
        let repo = MealRepository::new(self.pool.clone());
        let now = Utc::now();

        // 1. Import records that exist only in the spreadsheet. The remote
        //    local id is another device's key and is discarded.
        let mut imported = 0;
        for remote in &new_from_remote {
            let Some(sync_id) = &remote.sync_id else {
                continue;
            };
            repo.create(&import_draft(remote, sync_id)).await?;
            imported += 1;
        }

        // 2. First-touch migration of legacy rows.
        for mut meal in repo.get_all().await? {
            let mut changed = false;
            if meal.sync_id.is_none() {
                meal.sync_id = Some(Uuid::new_v4().to_string());
                changed = true;
            }
            if meal.modified_at.is_none() {
                meal.modified_at = Some(now);
                changed = true;
            }
            if changed {
                tracing::debug!("Backfilling sync identity for meal {}", meal.id);
                repo.update(&meal).await?;
            }
        }

        // 3. "Cloud" decisions overwrite local content, keeping the local
        //    id. "This device" decisions win by inaction.
        for resolution in &resolutions {
            if resolution.choice != ConflictChoice::Remote {
                continue;
            }
            match repo.get_by_sync_id(&resolution.sync_id).await? {
                Some(mut local) => {
                    let remote = &resolution.remote;
                    local.date = remote.date;
                    local.name = remote.name.clone();
                    local.meal_type = remote.meal_type;
                    local.calories = remote.calories;
                    local.protein = remote.protein;
                    local.carbs = remote.carbs;
                    local.fat = remote.fat;
                    local.sugar = remote.sugar;
                    local.notes = remote.notes.clone();
                    local.modified_at = Some(Utc::now());
                    repo.update(&local).await?;
                }
                None => {
                    tracing::warn!(
                        "Resolution references unknown sync id {}, skipping",
                        resolution.sync_id
                    );
                }
            }
        }

        // 4. Settings piggyback: adopt remote values for unset targets,
        //    then write the merged mapping back. The read is best-effort;
        //    an unreadable settings region must not sink the meal merge.
        let adapter = SheetAdapter::new(&self.api, &target.spreadsheet_id);
        adapter.ensure_settings_sheet().await?;
        match adapter.read_settings().await {
            Ok(settings) => {
                self.targets
                    .fill_missing_from(&MacroTargets::from_settings(&settings));
            }
            Err(e) => tracing::debug!("Settings read failed, keeping local targets: {}", e),
        }
        adapter.write_settings(&self.targets.to_settings()).await?;

        // 5. Push the full local set; the spreadsheet's shape is rewritten
        //    every round, its content now mirrors this device.
        let all = repo.get_all().await?;
        adapter.replace_rows(&all).await?;

        let synced_at = Utc::now();
        self.last_synced = Some(synced_at);
        self.state = SyncState::Idle;
        self.status = SyncStatus::Synced {
            sheet: Some(target.name.clone()),
        };
        tracing::debug!("Merge complete: {} imported, {} pushed", imported, all.len());

        Ok(MergeReport {
            imported,
            pushed: all.len(),
            targets: self.targets,
            synced_at,
        })
    }

    /// Full destructive import: wipes the local store and recreates it from
    /// the spreadsheet. An empty spreadsheet leaves local data alone.
    pub async fn load_from_remote(&mut self) -> Result<LoadOutcome, SyncError> {
        if !matches!(self.state, SyncState::Idle) {
            return Err(SyncError::Busy);
        }
        let Some(target) = self.target.clone() else {
            return Err(SyncError::NoTarget);
        };
        if !self.api.has_credential() {
            return Err(SyncError::NotAuthenticated);
        }

        self.state = SyncState::Syncing;
        self.status = SyncStatus::Syncing;
        match self.run_load(&target).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.state = SyncState::Idle;
                self.status = SyncStatus::Error;
                Err(e)
            }
        }
    }

    async fn run_load(&mut self, target: &SheetTarget) -> Result<LoadOutcome, SyncError> {
        let adapter = SheetAdapter::new(&self.api, &target.spreadsheet_id);
        let rows = adapter.fetch_rows().await?;

        let done = |engine: &mut Self| {
            engine.state = SyncState::Idle;
            engine.status = SyncStatus::Synced {
                sheet: Some(target.name.clone()),
            };
        };

        if rows.is_empty() {
            done(self);
            return Ok(LoadOutcome::EmptyRemote);
        }

        let repo = MealRepository::new(self.pool.clone());
        repo.clear().await?;

        let mut imported = 0;
        for remote in &rows {
            let draft = match &remote.sync_id {
                Some(sync_id) => import_draft(remote, sync_id),
                // Pre-sync rows get a fresh identity on import.
                None => NewMeal::new(remote.date, remote.name.clone(), remote.meal_type)
                    .with_macros(remote.protein, remote.carbs, remote.fat, remote.sugar)
                    .with_calories(remote.calories)
                    .with_notes(remote.notes.clone()),
            };
            repo.create(&draft).await?;
            imported += 1;
        }

        let remote_targets = MacroTargets::from_settings(&adapter.read_settings().await.unwrap_or_default());
        if remote_targets.is_set() {
            self.targets = remote_targets;
        }

        done(self);
        tracing::debug!("Loaded {} meal(s) from {}", imported, target.name);
        Ok(LoadOutcome::Loaded { imported })
    }

    /// Creates a new spreadsheet, writes the header contract and settings,
    /// pushes current local data, and links it as the sync target.
    pub async fn create_remote_target(&mut self, title: &str) -> Result<SheetTarget, SyncError> {
        if !matches!(self.state, SyncState::Idle) {
            return Err(SyncError::Busy);
        }
        if !self.api.has_credential() {
            return Err(SyncError::NotAuthenticated);
        }

        self.state = SyncState::Syncing;
        self.status = SyncStatus::Syncing;
        match self.run_create(title).await {
            Ok(t) => Ok(t),
            Err(e) => {
                self.state = SyncState::Idle;
                self.status = SyncStatus::Error;
                Err(e)
            }
        }
    }

    async fn run_create(&mut self, title: &str) -> Result<SheetTarget, SyncError> {
        let spreadsheet_id = self.api.create_spreadsheet(title, MEALS_SHEET).await?;
        let adapter = SheetAdapter::new(&self.api, &spreadsheet_id);

        adapter.ensure_settings_sheet().await?;
        adapter.write_settings(&self.targets.to_settings()).await?;

        let repo = MealRepository::new(self.pool.clone());
        let all = repo.get_all().await?;
        adapter.replace_rows(&all).await?;

        let target = SheetTarget {
            spreadsheet_id,
            name: title.to_string(),
        };
        self.target = Some(target.clone());
        self.last_synced = Some(Utc::now());
        self.state = SyncState::Idle;
        self.status = SyncStatus::Synced {
            sheet: Some(target.name.clone()),
        };
        tracing::debug!("Created spreadsheet '{}' with {} meal(s)", title, all.len());
        Ok(target)
    }
}
