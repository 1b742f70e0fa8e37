use clap::{Args, Subcommand};

use crate::config::Config;

#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand)]
pub enum AuthSubcommand {
    /// Cache a bearer token obtained from the Google OAuth flow
    SetToken {
        /// OAuth access token with spreadsheets scope
        token: String,
    },

    /// Show whether a credential is cached
    Status,

    /// Sign out: drop the cached credential and the sheet link
    Clear,
}

impl AuthCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AuthSubcommand::SetToken { token } => {
                let mut updated = config.clone();
                updated.access_token = Some(token.clone());
                let path = updated.save()?;
                println!("Credential cached in {}.", path.display());
                Ok(())
            }

            AuthSubcommand::Status => {
                if config.access_token.is_some() {
                    println!("Signed in (credential cached).");
                } else {
                    println!("Not signed in. Run `meallog auth set-token <TOKEN>`.");
                }
                Ok(())
            }

            AuthSubcommand::Clear => {
                let mut updated = config.clone();
                updated.access_token = None;
                updated.sheet.spreadsheet_id = None;
                updated.sheet.spreadsheet_name = None;
                updated.last_synced = None;
                updated.save()?;
                println!("Signed out. Local meals are untouched.");
                Ok(())
            }
        }
    }
}
