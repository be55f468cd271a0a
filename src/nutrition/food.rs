use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::nutrient::{self, RawNutrient, CARBS, FAT, PROTEIN};

/// One food item as returned by the FoodData Central search endpoint.
///
/// Everything is optional: a missing field becomes null in the normalized
/// record instead of failing the item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFood {
    #[serde(default)]
    pub fdc_id: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub brand_owner: Option<String>,
    #[serde(default)]
    pub serving_size: Option<Value>,
    #[serde(default)]
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<RawNutrient>,
}

/// Canonical macronutrient block, always in grams
#[derive(Debug, Clone, Serialize)]
pub struct Macros {
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

/// Canonical food record returned to API clients.
///
/// Calories are kcal rounded to 1 decimal, macros grams rounded to 2;
/// any value that is absent or unparseable upstream serializes as null.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFood {
    pub id: Option<Value>,
    pub description: Option<String>,
    pub brand_name: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_size_unit: Option<String>,
    pub calories: Option<f64>,
    pub macros: Macros,
}

/// Normalize one raw upstream item.
///
/// Returns None when the value is not a food object at all; the caller
/// drops such items so one malformed entry never fails the whole batch.
pub fn normalize_food(item: Value) -> Option<NormalizedFood> {
    let raw: RawFood = serde_json::from_value(item).ok()?;
    let nutrients = &raw.food_nutrients;

    Some(NormalizedFood {
        id: raw.fdc_id,
        description: raw.description,
        brand_name: raw.brand_name.or(raw.brand_owner),
        serving_size: raw.serving_size.as_ref().and_then(lenient_f64),
        serving_size_unit: raw.serving_size_unit,
        calories: nutrient::energy_kcal(nutrients),
        macros: Macros {
            protein_g: nutrient::mass_grams(nutrients, &PROTEIN),
            carbs_g: nutrient::mass_grams(nutrients, &CARBS),
            fat_g: nutrient::mass_grams(nutrients, &FAT),
        },
    })
}

fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_a_complete_item() {
        let item = json!({
            "fdcId": 534358,
            "description": "Cheddar Cheese",
            "brandOwner": "Kraft Heinz",
            "servingSize": 28.0,
            "servingSizeUnit": "g",
            "foodNutrients": [
                { "nutrientNumber": "1008", "nutrientName": "Energy", "value": 393.0, "unitName": "KCAL" },
                { "nutrientNumber": "1003", "nutrientName": "Protein", "value": 21.4, "unitName": "G" },
                { "nutrientNumber": "1005", "nutrientName": "Carbohydrate, by difference", "value": 3.57, "unitName": "G" },
                { "nutrientNumber": "1004", "nutrientName": "Total lipid (fat)", "value": 33.9, "unitName": "G" }
            ]
        });

        let food = normalize_food(item).expect("item should normalize");
        assert_eq!(food.description.as_deref(), Some("Cheddar Cheese"));
        assert_eq!(food.brand_name.as_deref(), Some("Kraft Heinz"));
        assert_eq!(food.serving_size, Some(28.0));
        assert_eq!(food.calories, Some(393.0));
        assert_eq!(food.macros.protein_g, Some(21.4));
        assert_eq!(food.macros.carbs_g, Some(3.57));
        assert_eq!(food.macros.fat_g, Some(33.9));
    }

    #[test]
    fn brand_name_wins_over_brand_owner() {
        let item = json!({
            "fdcId": 1,
            "description": "Yogurt",
            "brandName": "Brand A",
            "brandOwner": "Owner B"
        });
        let food = normalize_food(item).expect("item should normalize");
        assert_eq!(food.brand_name.as_deref(), Some("Brand A"));
    }

    #[test]
    fn missing_nutrients_yield_all_nulls() {
        let item = json!({ "fdcId": 2, "description": "Mystery Food" });
        let food = normalize_food(item).expect("item should normalize");
        assert!(food.calories.is_none());
        assert!(food.macros.protein_g.is_none());
        assert!(food.macros.carbs_g.is_none());
        assert!(food.macros.fat_g.is_none());
    }

    #[test]
    fn non_object_item_is_dropped() {
        assert!(normalize_food(json!("just a string")).is_none());
        assert!(normalize_food(json!(42)).is_none());
        assert!(normalize_food(json!(null)).is_none());
    }

    #[test]
    fn serialized_shape_matches_api_contract() {
        let item = json!({ "fdcId": 3, "description": "Apple" });
        let food = normalize_food(item).expect("item should normalize");
        let out = serde_json::to_value(&food).expect("serializes");

        assert_eq!(out["id"], json!(3));
        assert!(out["brandName"].is_null());
        assert!(out["servingSizeUnit"].is_null());
        assert!(out["calories"].is_null());
        assert!(out["macros"]["protein_g"].is_null());
        assert!(out["macros"]["carbs_g"].is_null());
        assert!(out["macros"]["fat_g"].is_null());
    }

    #[test]
    fn serving_size_parses_from_string() {
        let item = json!({ "fdcId": 4, "servingSize": "240" });
        let food = normalize_food(item).expect("item should normalize");
        assert_eq!(food.serving_size, Some(240.0));
    }
}
