pub mod food;
pub mod nutrient;

pub use food::{normalize_food, Macros, NormalizedFood, RawFood};
pub use nutrient::{find_nutrient, RawNutrient};
