//! Sync CLI commands for synchronizing with the linked spreadsheet.

use clap::{Args, Subcommand};
use std::collections::HashMap;

use super::{build_engine, save_session};
use crate::config::Config;
use crate::db::init_db;
use crate::sheets::RemoteMeal;
use crate::sync::{
    Conflict, ConflictChoice, MergeReport, SkipReason, SyncOutcome,
};

#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,

    /// Resolve the named conflict from the cloud copy (repeatable)
    #[arg(long = "cloud", value_name = "SYNC_ID")]
    cloud: Vec<String>,

    /// Resolve every conflict from the cloud copy
    #[arg(long)]
    all_cloud: bool,

    /// Resolve every conflict by keeping this device's copy
    #[arg(long)]
    keep_local: bool,
}

#[derive(Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration and last sync time
    Status,
}

impl SyncCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let rt = tokio::runtime::Runtime::new()?;
        match &self.command {
            None => rt.block_on(self.sync(config)),
            Some(SyncSubcommand::Status) => {
                self.status(config);
                Ok(())
            }
        }
    }

    async fn sync(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let pool = init_db(config.database_path.value.clone()).await?;
        let mut engine = build_engine(config, pool);

        println!("Syncing...");
        let outcome = engine.smart_sync().await?;

        match outcome {
            SyncOutcome::Skipped(reason) => {
                match reason {
                    SkipReason::NoTarget => {
                        println!("No spreadsheet linked. Run `meallog sheet create` or `meallog sheet link` first.");
                    }
                    SkipReason::NotAuthenticated => {
                        println!("Not signed in. Run `meallog auth set-token` first.");
                    }
                    SkipReason::AlreadySyncing => {
                        println!("A sync is already in progress.");
                    }
                }
                Ok(())
            }

            SyncOutcome::Completed(report) => {
                save_session(config, &engine)?;
                print_report(&report);
                Ok(())
            }

            SyncOutcome::ConflictsPending { conflicts } => {
                let pending_conflicts: Vec<Conflict> = engine
                    .pending()
                    .map(|p| p.conflicts.clone())
                    .unwrap_or_default();
                println!(
                    "{} meal(s) were edited both here and in the cloud:",
                    conflicts
                );
                println!();
                for conflict in &pending_conflicts {
                    print_conflict(conflict);
                }

                let Some(choices) = self.choices(&pending_conflicts) else {
                    // No decision given: keep local data and skip this round.
                    engine.cancel();
                    println!("Nothing was changed.");
                    println!("Re-run with --keep-local, --all-cloud, or --cloud <SYNC_ID> to decide.");
                    return Ok(());
                };

                let report = engine.resolve(&choices).await?;
                save_session(config, &engine)?;
                print_report(&report);
                Ok(())
            }
        }
    }

    /// Decision mapping from the flags, or `None` when the user hasn't
    /// decided yet.
    fn choices(&self, conflicts: &[Conflict]) -> Option<HashMap<String, ConflictChoice>> {
        if self.all_cloud {
            return Some(
                conflicts
                    .iter()
                    .map(|c| (c.sync_id.clone(), ConflictChoice::Remote))
                    .collect(),
            );
        }
        if !self.cloud.is_empty() {
            // Unnamed conflicts fall back to the default: keep this device.
            return Some(
                self.cloud
                    .iter()
                    .map(|id| (id.clone(), ConflictChoice::Remote))
                    .collect(),
            );
        }
        if self.keep_local {
            return Some(HashMap::new());
        }
        None
    }

    fn status(&self, config: &Config) {
        println!("Sync Status");
        println!("===========");
        println!();

        match (&config.sheet.spreadsheet_id, &config.sheet.spreadsheet_name) {
            (Some(id), name) => {
                println!(
                    "Spreadsheet: {} ({})",
                    name.as_deref().unwrap_or("unnamed"),
                    id
                );
            }
            (None, _) => println!("Spreadsheet: not linked"),
        }
        println!(
            "Signed in:   {}",
            if config.access_token.is_some() {
                "yes"
            } else {
                "no"
            }
        );
        match &config.last_synced {
            Some(at) => println!("Last sync:   {}", at.to_rfc3339()),
            None => println!("Last sync:   never"),
        }
    }
}

fn print_report(report: &MergeReport) {
    if report.imported > 0 {
        println!(
            "Synced: {} meal(s) imported, {} in the cloud.",
            report.imported, report.pushed
        );
    } else {
        println!("Synced: {} meal(s) in the cloud.", report.pushed);
    }
}

fn print_conflict(conflict: &Conflict) {
    let local = &conflict.local;
    println!("  {} [{}]", local.name, conflict.sync_id);
    println!(
        "    this device: {} {} - {} kcal (P{} C{} F{} S{})",
        local.date,
        local.name,
        local.calories,
        local.protein,
        local.carbs,
        local.fat,
        local.sugar
    );
    println!("    cloud:       {}", summary_remote(&conflict.remote));
}

fn summary_remote(m: &RemoteMeal) -> String {
    format!(
        "{} {} - {} kcal (P{} C{} F{} S{})",
        m.date, m.name, m.calories, m.protein, m.carbs, m.fat, m.sugar
    )
}
