//! Unit conversion tables

use crate::error::UtilityError;
use crate::Result;

/// Factors to metres
const LENGTH: &[(&str, f64)] = &[
    ("m", 1.0),
    ("km", 1000.0),
    ("cm", 0.01),
    ("mm", 0.001),
    ("in", 0.0254),
    ("ft", 0.3048),
    ("yd", 0.9144),
    ("mi", 1609.344),
];

/// Factors to kilograms
const WEIGHT: &[(&str, f64)] = &[
    ("kg", 1.0),
    ("g", 0.001),
    ("mg", 1e-6),
    ("lb", 0.45359237),
    ("oz", 0.028349523125),
];

/// Factors to litres (US customary)
const VOLUME: &[(&str, f64)] = &[
    ("l", 1.0),
    ("ml", 0.001),
    ("gal", 3.78541),
    ("qt", 0.946353),
    ("pt", 0.473176),
    ("cup", 0.236588),
    ("floz", 0.0295735),
];

fn factor(table: &[(&str, f64)], unit: &str) -> Option<f64> {
    table.iter().find(|(name, _)| *name == unit).map(|(_, f)| *f)
}

pub fn convert(value: f64, from: &str, to: &str) -> Result<f64> {
    let from_key = from.trim().to_ascii_lowercase();
    let to_key = to.trim().to_ascii_lowercase();

    [LENGTH, WEIGHT, VOLUME]
        .into_iter()
        .find_map(|table| Some((factor(table, &from_key)?, factor(table, &to_key)?)))
        .map(|(from_factor, to_factor)| value * from_factor / to_factor)
        .ok_or_else(|| UtilityError::IncompatibleUnits {
            from: from.to_string(),
            to: to.to_string(),
        })
}

/// Every unit `convert` understands
pub fn supported_units() -> impl Iterator<Item = &'static str> {
    [LENGTH, WEIGHT, VOLUME]
        .into_iter()
        .flat_map(|table| table.iter().map(|(name, _)| *name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length() {
        assert!((convert(1.0, "mi", "km").unwrap() - 1.609344).abs() < 1e-12);
        assert!((convert(12.0, "in", "ft").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip() {
        let feet = convert(5.0, "m", "ft").unwrap();
        assert!((convert(feet, "ft", "m").unwrap() - 5.0).abs() < 1e-9);

        let ounces = convert(2.0, "kg", "oz").unwrap();
        assert!((convert(ounces, "oz", "kg").unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(convert(1.0, "KG", "g").unwrap(), 1000.0);
    }

    #[test]
    fn test_incompatible_units() {
        assert!(matches!(
            convert(1.0, "kg", "m"),
            Err(UtilityError::IncompatibleUnits { .. })
        ));
        assert!(convert(1.0, "parsec", "m").is_err());
    }

    #[test]
    fn test_supported_units() {
        assert_eq!(supported_units().count(), 20);
        assert!(supported_units().any(|u| u == "floz"));
    }
}
