use serde::Deserialize;
use serde_json::Value;

/// Kilojoules per kilocalorie
const KJ_PER_KCAL: f64 = 4.184;

/// One nutrient entry as returned by the FoodData Central search endpoint.
///
/// Field names and types drift between dataset releases, so every field is
/// optional and the code/value may arrive as either a string or a number.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNutrient {
    #[serde(default, alias = "nutrientNumber", alias = "number")]
    pub code: Option<Value>,
    #[serde(default, alias = "nutrientName")]
    pub name: Option<String>,
    #[serde(default, alias = "amount")]
    pub value: Option<Value>,
    #[serde(default, alias = "unitName")]
    pub unit: Option<String>,
}

/// Identifiers that select one nutrient out of a raw nutrient list.
///
/// Codes match exactly after trimming; names match case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct NutrientAliases {
    pub codes: &'static [&'static str],
    pub names: &'static [&'static str],
}

pub const ENERGY: NutrientAliases = NutrientAliases {
    codes: &["1008"],
    names: &["Energy"],
};

pub const PROTEIN: NutrientAliases = NutrientAliases {
    codes: &["1003"],
    names: &["Protein"],
};

pub const FAT: NutrientAliases = NutrientAliases {
    codes: &["1004"],
    names: &["Total lipid (fat)", "Fat"],
};

pub const CARBS: NutrientAliases = NutrientAliases {
    codes: &["1005"],
    names: &["Carbohydrate, by difference", "Carbohydrates"],
};

/// Find the first nutrient matching any of the given identifiers.
///
/// No match is not an error: absent nutrients normalize to null downstream.
pub fn find_nutrient<'a>(
    nutrients: &'a [RawNutrient],
    aliases: &NutrientAliases,
) -> Option<&'a RawNutrient> {
    nutrients.iter().find(|n| {
        let code_match = n
            .code
            .as_ref()
            .and_then(code_string)
            .is_some_and(|code| aliases.codes.iter().any(|c| *c == code));
        let name_match = n.name.as_deref().is_some_and(|name| {
            let name = name.trim();
            aliases.names.iter().any(|a| a.eq_ignore_ascii_case(name))
        });
        code_match || name_match
    })
}

/// Energy in kilocalories, rounded to 1 decimal place.
///
/// Upstream reports energy in either kcal or kJ; kJ is converted.
pub fn energy_kcal(nutrients: &[RawNutrient]) -> Option<f64> {
    let record = find_nutrient(nutrients, &ENERGY)?;
    let raw = record.value.as_ref().and_then(numeric_value)?;
    let kcal = if unit_is(record, "kj") {
        raw / KJ_PER_KCAL
    } else {
        raw
    };
    finite_round(kcal, 1)
}

/// Mass in grams for the nutrient selected by `aliases`, rounded to
/// 2 decimal places. Milligram values are converted.
pub fn mass_grams(nutrients: &[RawNutrient], aliases: &NutrientAliases) -> Option<f64> {
    let record = find_nutrient(nutrients, aliases)?;
    let raw = record.value.as_ref().and_then(numeric_value)?;
    let grams = if unit_is(record, "mg") {
        raw / 1000.0
    } else {
        raw
    };
    finite_round(grams, 2)
}

fn unit_is(record: &RawNutrient, unit: &str) -> bool {
    record
        .unit
        .as_deref()
        .is_some_and(|u| u.trim().eq_ignore_ascii_case(unit))
}

/// Nutrient codes arrive as strings ("1008") or numbers (1008)
fn code_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Lenient numeric parse: JSON number or numeric string
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Round to `decimals` places, mapping non-finite input to None so NaN and
/// infinity can never reach a response body.
fn finite_round(value: f64, decimals: u32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let factor = 10f64.powi(decimals as i32);
    Some((value * factor).round() / factor)
}
