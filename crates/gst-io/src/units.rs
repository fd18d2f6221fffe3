//! Unit conversion for loaded tables
//!
//! Emissions are reported in Mt CO2e and population in persons. Tables in
//! any other unit are kept as they are, with a warning for emissions.

use crate::table::YearTable;

/// A multiplicative conversion between two unit labels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    pub from: &'static str,
    pub to: &'static str,
    pub factor: f64,
}

/// Known emissions conversions to MtCO2eq
pub const EMISSIONS_CONVERSIONS: &[UnitConversion] = &[
    UnitConversion {
        from: "GgCO2eq",
        to: "MtCO2eq",
        factor: 1e-3,
    },
    UnitConversion {
        from: "ktCO2eq",
        to: "MtCO2eq",
        factor: 1e-3,
    },
    UnitConversion {
        from: "tCO2eq",
        to: "MtCO2eq",
        factor: 1e-6,
    },
];

/// Known population conversions to persons
pub const POPULATION_CONVERSIONS: &[UnitConversion] = &[UnitConversion {
    from: "ThousandPers",
    to: "Pers",
    factor: 1e3,
}];

/// Find the conversion for `unit` in `table`
pub fn find_conversion(
    table: &'static [UnitConversion],
    unit: &str,
) -> Option<&'static UnitConversion> {
    table.iter().find(|c| c.from == unit)
}

/// Convert emissions to MtCO2eq where a conversion is known
pub fn convert_emissions(table: &YearTable) -> YearTable {
    let unit = table.unit.as_deref().unwrap_or_default();
    if unit == "MtCO2eq" {
        return table.clone();
    }

    match find_conversion(EMISSIONS_CONVERSIONS, unit) {
        Some(c) => {
            tracing::info!("Converting emissions from {} to {}", c.from, c.to);
            table.scale(c.factor, c.to)
        }
        None => {
            tracing::warn!(
                "Conversion not defined. Emissions data units remain as {:?}",
                unit
            );
            table.clone()
        }
    }
}

/// Convert population to persons where a conversion is known
pub fn convert_population(table: &YearTable) -> YearTable {
    let unit = table.unit.as_deref().unwrap_or_default();
    match find_conversion(POPULATION_CONVERSIONS, unit) {
        Some(c) => {
            tracing::info!("Converting population from {} to {}", c.from, c.to);
            table.scale(c.factor, c.to)
        }
        None => {
            tracing::info!("Keeping population data as {:?}", unit);
            table.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(unit: &str, value: f64) -> YearTable {
        YearTable::new(vec!["EGY".into()], vec![2019], vec![vec![value]])
            .unwrap()
            .with_unit(unit)
    }

    #[test]
    fn test_convert_emissions_gg_to_mt() {
        let converted = convert_emissions(&table("GgCO2eq", 2500.0));
        assert_eq!(converted.unit.as_deref(), Some("MtCO2eq"));
        assert!((converted.value("EGY", 2019).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_convert_emissions_unknown_unit_kept() {
        let converted = convert_emissions(&table("CO2 * gigagram / a", 7.0));
        assert_eq!(converted.unit.as_deref(), Some("CO2 * gigagram / a"));
        assert_eq!(converted.value("EGY", 2019), Some(7.0));
    }

    #[test]
    fn test_convert_population() {
        let converted = convert_population(&table("ThousandPers", 104.3));
        assert_eq!(converted.unit.as_deref(), Some("Pers"));
        assert!((converted.value("EGY", 2019).unwrap() - 104_300.0).abs() < 1e-6);

        let kept = convert_population(&table("Pers", 5.0));
        assert_eq!(kept.value("EGY", 2019), Some(5.0));
    }
}
