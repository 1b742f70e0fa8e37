use chrono::Local;
use clap::{Args, Subcommand};

use super::{build_engine, save_session};
use crate::config::Config;
use crate::db::init_db;
use crate::sync::LoadOutcome;

#[derive(Args)]
pub struct SheetCommand {
    #[command(subcommand)]
    pub command: SheetSubcommand,
}

#[derive(Subcommand)]
pub enum SheetSubcommand {
    /// Create a new spreadsheet, seed it with local data, and link it
    Create {
        /// Spreadsheet title, defaults to "Meal Logger - <today>"
        title: Option<String>,
    },

    /// Link an existing spreadsheet by id
    Link {
        /// Spreadsheet id (from its URL)
        spreadsheet_id: String,

        /// Display name for status output
        #[arg(long)]
        name: Option<String>,
    },

    /// Replace all local meals with the spreadsheet's contents
    Load {
        /// Confirm wiping local data first
        #[arg(long)]
        yes: bool,
    },

    /// Forget the linked spreadsheet (data is kept on both sides)
    Unlink,
}

impl SheetCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async {
            match &self.command {
                SheetSubcommand::Create { title } => {
                    let title = title.clone().unwrap_or_else(|| {
                        format!("Meal Logger - {}", Local::now().date_naive())
                    });

                    let pool = init_db(config.database_path.value.clone()).await?;
                    let mut engine = build_engine(config, pool);
                    let target = engine.create_remote_target(&title).await?;
                    save_session(config, &engine)?;

                    println!(
                        "Created spreadsheet '{}' ({}) and linked it.",
                        target.name, target.spreadsheet_id
                    );
                    Ok(())
                }

                SheetSubcommand::Link {
                    spreadsheet_id,
                    name,
                } => {
                    let mut updated = config.clone();
                    updated.sheet.spreadsheet_id = Some(spreadsheet_id.clone());
                    updated.sheet.spreadsheet_name = name.clone();
                    // A newly linked sheet has no sync history on this device.
                    updated.last_synced = None;
                    updated.save()?;

                    println!("Linked spreadsheet {}.", spreadsheet_id);
                    println!("Run `meallog sync` to merge, or `meallog sheet load` to replace local data.");
                    Ok(())
                }

                SheetSubcommand::Load { yes } => {
                    if !yes {
                        println!("This replaces every locally logged meal with the spreadsheet's contents.");
                        println!("Re-run with --yes to confirm.");
                        return Ok(());
                    }

                    let pool = init_db(config.database_path.value.clone()).await?;
                    let mut engine = build_engine(config, pool);
                    match engine.load_from_remote().await? {
                        LoadOutcome::EmptyRemote => {
                            println!("No data found in the spreadsheet; local meals were kept.");
                        }
                        LoadOutcome::Loaded { imported } => {
                            save_session(config, &engine)?;
                            println!("Loaded {} meal(s) from the spreadsheet.", imported);
                        }
                    }
                    Ok(())
                }

                SheetSubcommand::Unlink => {
                    let mut updated = config.clone();
                    updated.sheet.spreadsheet_id = None;
                    updated.sheet.spreadsheet_name = None;
                    updated.last_synced = None;
                    updated.save()?;

                    println!("Unlinked. Local meals are untouched.");
                    Ok(())
                }
            }
        })
    }
}
