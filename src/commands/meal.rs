use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::db::{init_db, MealRepository};
use crate::models::{derived_calories, MacroTargets, Meal, MealType, NewMeal};

#[derive(Args)]
pub struct MealCommand {
    #[command(subcommand)]
    pub command: MealSubcommand,
}

#[derive(Subcommand)]
pub enum MealSubcommand {
    /// Log a meal
    Add {
        /// Meal name
        name: String,

        /// Meal type (breakfast, lunch, dinner, snack)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        meal_type: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Protein in grams
        #[arg(long, default_value_t = 0)]
        protein: u32,

        /// Carbs in grams
        #[arg(long, default_value_t = 0)]
        carbs: u32,

        /// Fat in grams
        #[arg(long, default_value_t = 0)]
        fat: u32,

        /// Sugar in grams
        #[arg(long, default_value_t = 0)]
        sugar: u32,

        /// Calories; computed from macros (4/4/9) when omitted
        #[arg(long)]
        calories: Option<u32>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show meals for a day
    List {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Show every logged meal instead of one day
        #[arg(long)]
        all: bool,
    },

    /// Edit a logged meal
    Edit {
        /// Meal id (see `meal list`)
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type", short = 't', value_name = "TYPE")]
        meal_type: Option<String>,

        #[arg(long, short)]
        date: Option<String>,

        #[arg(long)]
        protein: Option<u32>,

        #[arg(long)]
        carbs: Option<u32>,

        #[arg(long)]
        fat: Option<u32>,

        #[arg(long)]
        sugar: Option<u32>,

        #[arg(long)]
        calories: Option<u32>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a logged meal
    Delete {
        /// Meal id
        id: i64,

        /// Confirm the delete
        #[arg(long)]
        yes: bool,
    },
}

fn parse_date(date: &Option<String>) -> Result<NaiveDate, String> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s)),
        None => Ok(Local::now().date_naive()),
    }
}

impl MealCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async {
            let pool = init_db(config.database_path.value.clone()).await?;
            let repo = MealRepository::new(pool);

            match &self.command {
                MealSubcommand::Add {
                    name,
                    meal_type,
                    date,
                    protein,
                    carbs,
                    fat,
                    sugar,
                    calories,
                    notes,
                } => {
                    if name.trim().is_empty() {
                        return Err("Meal name must not be empty".into());
                    }
                    let date = parse_date(date)?;
                    let meal_type: MealType = meal_type.parse()?;

                    let mut draft = NewMeal::new(date, name.trim(), meal_type)
                        .with_macros(*protein, *carbs, *fat, *sugar);
                    if let Some(calories) = calories {
                        draft = draft.with_calories(*calories);
                    }
                    if let Some(notes) = notes {
                        draft = draft.with_notes(notes.clone());
                    }

                    let created = repo.create(&draft).await?;
                    println!("Logged: {}", created);
                    Ok(())
                }

                MealSubcommand::List { date, all } => {
                    if *all {
                        let meals = repo.get_all().await?;
                        if meals.is_empty() {
                            println!("No meals logged yet.");
                            return Ok(());
                        }
                        for meal in &meals {
                            println!("{}", meal);
                        }
                        return Ok(());
                    }

                    let date = parse_date(date)?;
                    let meals = repo.get_by_date(date).await?;
                    if meals.is_empty() {
                        println!("No meals logged on {}.", date);
                        return Ok(());
                    }
                    for meal in &meals {
                        println!("{}", meal);
                    }
                    println!();
                    print_day_summary(&meals, &config.targets);
                    Ok(())
                }

                MealSubcommand::Edit {
                    id,
                    name,
                    meal_type,
                    date,
                    protein,
                    carbs,
                    fat,
                    sugar,
                    calories,
                    notes,
                } => {
                    let mut meal = repo
                        .get_by_id(*id)
                        .await?
                        .ok_or_else(|| format!("Meal not found: {}", id))?;

                    if let Some(name) = name {
                        if name.trim().is_empty() {
                            return Err("Meal name must not be empty".into());
                        }
                        meal.name = name.trim().to_string();
                    }
                    if let Some(meal_type) = meal_type {
                        meal.meal_type = meal_type.parse()?;
                    }
                    if let Some(date) = date {
                        meal.date = parse_date(&Some(date.clone()))?;
                    }
                    let macros_changed =
                        protein.is_some() || carbs.is_some() || fat.is_some() || sugar.is_some();
                    if let Some(protein) = protein {
                        meal.protein = *protein;
                    }
                    if let Some(carbs) = carbs {
                        meal.carbs = *carbs;
                    }
                    if let Some(fat) = fat {
                        meal.fat = *fat;
                    }
                    if let Some(sugar) = sugar {
                        meal.sugar = *sugar;
                    }
                    match calories {
                        Some(calories) => meal.calories = *calories,
                        None if macros_changed => {
                            meal.calories = derived_calories(meal.protein, meal.carbs, meal.fat);
                        }
                        None => {}
                    }
                    if let Some(notes) = notes {
                        meal.notes = notes.clone();
                    }

                    // An edit bumps the modification stamp; sync identity
                    // stays put.
                    meal.modified_at = Some(Utc::now());
                    repo.update(&meal).await?;
                    println!("Updated: {}", meal);
                    Ok(())
                }

                MealSubcommand::Delete { id, yes } => {
                    let Some(meal) = repo.get_by_id(*id).await? else {
                        println!("Meal {} does not exist.", id);
                        return Ok(());
                    };
                    if !yes {
                        println!("Would delete: {}", meal);
                        println!("Re-run with --yes to confirm.");
                        return Ok(());
                    }
                    repo.delete(*id).await?;
                    println!("Deleted meal {}.", id);
                    Ok(())
                }
            }
        })
    }
}

fn print_day_summary(meals: &[Meal], targets: &MacroTargets) {
    let calories: u32 = meals.iter().map(|m| m.calories).sum();
    let protein: u32 = meals.iter().map(|m| m.protein).sum();
    let carbs: u32 = meals.iter().map(|m| m.carbs).sum();
    let fat: u32 = meals.iter().map(|m| m.fat).sum();
    let sugar: u32 = meals.iter().map(|m| m.sugar).sum();

    let against = |total: u32, target: u32| -> String {
        if target == 0 {
            format!("{}g", total)
        } else {
            format!("{}g / {}g", total, target)
        }
    };

    println!("Total: {} kcal", calories);
    println!("  protein: {}", against(protein, targets.protein));
    println!("  carbs:   {}", against(carbs, targets.carbs));
    println!("  fat:     {}", against(fat, targets.fat));
    println!("  sugar:   {}", against(sugar, targets.sugar));
}
