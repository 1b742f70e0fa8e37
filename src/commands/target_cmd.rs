use clap::{Args, Subcommand};

use crate::config::Config;

#[derive(Args)]
pub struct TargetCommand {
    #[command(subcommand)]
    pub command: TargetSubcommand,
}

#[derive(Subcommand)]
pub enum TargetSubcommand {
    /// Set daily macro targets (grams); unset macros keep their value
    Set {
        #[arg(long)]
        protein: Option<u32>,

        #[arg(long)]
        carbs: Option<u32>,

        #[arg(long)]
        fat: Option<u32>,

        #[arg(long)]
        sugar: Option<u32>,
    },

    /// Show daily macro targets
    Show,
}

impl TargetCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TargetSubcommand::Set {
                protein,
                carbs,
                fat,
                sugar,
            } => {
                if protein.is_none() && carbs.is_none() && fat.is_none() && sugar.is_none() {
                    return Err("Nothing to set. Pass at least one of --protein, --carbs, --fat, --sugar.".into());
                }

                let mut updated = config.clone();
                if let Some(protein) = protein {
                    updated.targets.protein = *protein;
                }
                if let Some(carbs) = carbs {
                    updated.targets.carbs = *carbs;
                }
                if let Some(fat) = fat {
                    updated.targets.fat = *fat;
                }
                if let Some(sugar) = sugar {
                    updated.targets.sugar = *sugar;
                }
                updated.save()?;

                print_targets(&updated);
                println!();
                println!("Targets sync to the spreadsheet on the next `meallog sync`.");
                Ok(())
            }

            TargetSubcommand::Show => {
                print_targets(config);
                Ok(())
            }
        }
    }
}

fn print_targets(config: &Config) {
    let show = |v: u32| -> String {
        if v == 0 {
            "not set".to_string()
        } else {
            format!("{}g", v)
        }
    };
    println!("Daily targets");
    println!("  protein: {}", show(config.targets.protein));
    println!("  carbs:   {}", show(config.targets.carbs));
    println!("  fat:     {}", show(config.targets.fat));
    println!("  sugar:   {}", show(config.targets.sugar));
}
