mod meal;
mod target;

pub use meal::{derived_calories, Meal, MealType, NewMeal};
pub use target::MacroTargets;
