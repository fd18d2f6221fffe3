//! NDC sector and gas coverage
//!
//! The coverage dataset lists one country per row (`ISO3`) and one column
//! per gas/sector pair, named `"<gas> <sector>"`. Each cell says whether the
//! country's (I)NDC covers that combination.
//!
//! Countries outside the UNFCCC and EU member states (reported as part of
//! the EU) are dropped on load. A country without an NDC counts as not
//! covered; cells with no information count as covered only in the
//! optimistic reading.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::reader::{IoError, IoResult};
use crate::schema::RawTable;

/// Column holding the ISO3 country code
pub const NDC_COUNTRY_COLUMN: &str = "ISO3";

/// Coverage of one gas/sector pair in one country's NDC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NdcStatus {
    Covered,
    NotCovered,
    /// The NDC does not say
    NoInformation,
    /// The country has neither an NDC nor an INDC
    NoNdc,
    /// Covered through the EU's NDC
    SeeEu,
    /// Not a Party to the UNFCCC
    NonUnfccc,
}

impl NdcStatus {
    /// Whether the combination counts as covered
    ///
    /// `optimistic` decides how missing information is read.
    pub fn is_covered(self, optimistic: bool) -> bool {
        match self {
            NdcStatus::Covered => true,
            NdcStatus::NoInformation => optimistic,
            NdcStatus::NotCovered | NdcStatus::NoNdc => false,
            NdcStatus::SeeEu | NdcStatus::NonUnfccc => false,
        }
    }

    /// Rows with this status are removed on load
    fn excludes_country(self) -> bool {
        matches!(self, NdcStatus::SeeEu | NdcStatus::NonUnfccc)
    }
}

impl FromStr for NdcStatus {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Covered" => Ok(NdcStatus::Covered),
            "NotCovered" => Ok(NdcStatus::NotCovered),
            "NoInformation" | "" => Ok(NdcStatus::NoInformation),
            "NoNDC_NoINDC" => Ok(NdcStatus::NoNdc),
            "See EU" => Ok(NdcStatus::SeeEu),
            "NonUNFCCC" => Ok(NdcStatus::NonUnfccc),
            other => Err(IoError::InvalidFormat(format!(
                "unknown NDC coverage entry {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for NdcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NdcStatus::Covered => "Covered",
            NdcStatus::NotCovered => "NotCovered",
            NdcStatus::NoInformation => "NoInformation",
            NdcStatus::NoNdc => "NoNDC_NoINDC",
            NdcStatus::SeeEu => "See EU",
            NdcStatus::NonUnfccc => "NonUNFCCC",
        };
        f.write_str(s)
    }
}

/// A gas/sector pair, e.g. `CO2` in `Energy`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Combination {
    pub gas: String,
    pub sector: String,
}

impl FromStr for Combination {
    type Err = IoError;

    /// Split a `"<gas> <sector>"` header at its first space
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (gas, sector) = s.trim().split_once(' ').ok_or_else(|| {
            IoError::InvalidFormat(format!("coverage column {:?} is not \"<gas> <sector>\"", s))
        })?;
        Ok(Self {
            gas: gas.to_string(),
            sector: sector.trim().to_string(),
        })
    }
}

/// NDC coverage per country and gas/sector pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdcCoverage {
    countries: Vec<String>,
    combinations: Vec<Combination>,
    /// `statuses[country][combination]`
    statuses: Vec<Vec<NdcStatus>>,
}

/// Boolean coverage under one reading of missing information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageMatrix {
    pub optimistic: bool,
    pub countries: Vec<String>,
    pub combinations: Vec<Combination>,
    /// `covered[country][combination]`
    pub covered: Vec<Vec<bool>>,
}

impl NdcCoverage {
    /// Parse the wide coverage table
    pub fn from_raw(raw: &RawTable) -> IoResult<Self> {
        let index = raw
            .column_index(NDC_COUNTRY_COLUMN)
            .ok_or_else(|| IoError::ColumnNotFound(NDC_COUNTRY_COLUMN.to_string()))?;

        let columns: Vec<(usize, Combination)> = raw
            .headers
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(i, header)| header.parse().map(|c| (i, c)))
            .collect::<IoResult<_>>()?;

        let mut countries = Vec::with_capacity(raw.num_rows());
        let mut statuses = Vec::with_capacity(raw.num_rows());
        let mut excluded = BTreeSet::new();
        for row in &raw.rows {
            let country = row.get(index).map(|s| s.trim()).unwrap_or_default();
            let row_statuses = columns
                .iter()
                .map(|(i, _)| row.get(*i).map_or("", |s| s.as_str()).parse())
                .collect::<IoResult<Vec<NdcStatus>>>()?;

            if row_statuses.iter().any(|s| s.excludes_country()) {
                excluded.insert(country.to_string());
                continue;
            }
            countries.push(country.to_string());
            statuses.push(row_statuses);
        }

        if !excluded.is_empty() {
            tracing::info!(
                "Dropped {} countries reported through the EU or outside the UNFCCC",
                excluded.len()
            );
            tracing::debug!("Dropped countries: {:?}", excluded);
        }

        Ok(Self {
            countries,
            combinations: columns.into_iter().map(|(_, c)| c).collect(),
            statuses,
        })
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }

    /// Status of one country and gas/sector pair
    pub fn status(&self, country: &str, gas: &str, sector: &str) -> Option<NdcStatus> {
        let row = self.countries.iter().position(|c| c == country)?;
        let col = self
            .combinations
            .iter()
            .position(|c| c.gas == gas && c.sector == sector)?;
        Some(self.statuses[row][col])
    }

    /// Coverage as booleans; `optimistic` counts missing information as covered
    pub fn coverage_matrix(&self, optimistic: bool) -> CoverageMatrix {
        CoverageMatrix {
            optimistic,
            countries: self.countries.clone(),
            combinations: self.combinations.clone(),
            covered: self
                .statuses
                .iter()
                .map(|row| row.iter().map(|s| s.is_covered(optimistic)).collect())
                .collect(),
        }
    }
}

impl CoverageMatrix {
    /// Fraction of countries covering each gas/sector pair
    pub fn share_covered(&self) -> Vec<f64> {
        let n = self.countries.len();
        (0..self.combinations.len())
            .map(|j| {
                if n == 0 {
                    return f64::NAN;
                }
                let covered = self.covered.iter().filter(|row| row[j]).count();
                covered as f64 / n as f64
            })
            .collect()
    }

    /// Distinct gases, in column order
    pub fn gases(&self) -> Vec<&str> {
        unique_in_order(self.combinations.iter().map(|c| c.gas.as_str()))
    }

    /// Distinct sectors, in column order
    pub fn sectors(&self) -> Vec<&str> {
        unique_in_order(self.combinations.iter().map(|c| c.sector.as_str()))
    }
}

fn unique_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    items.filter(|s| seen.insert(*s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::{CsvOptions, CsvReader};
    use rstest::rstest;

    const COVERAGE: &str = "\
ISO3,CO2 Energy,CH4 Energy,CO2 Agriculture,N2O Industrial Processes
EGY,Covered,NoInformation,NotCovered,Covered
AUT,See EU,See EU,See EU,See EU
EUU,Covered,Covered,Covered,NoInformation
VAT,NonUNFCCC,NonUNFCCC,NonUNFCCC,NonUNFCCC
SSD,NoNDC_NoINDC,NoNDC_NoINDC,NoNDC_NoINDC,NoNDC_NoINDC
";

    fn coverage() -> NdcCoverage {
        let raw = CsvReader::from_reader(COVERAGE.as_bytes(), CsvOptions::default()).unwrap();
        NdcCoverage::from_raw(&raw).unwrap()
    }

    #[test]
    fn test_drops_eu_members_and_non_parties() {
        let coverage = coverage();
        assert_eq!(coverage.countries(), &["EGY", "EUU", "SSD"]);
        assert_eq!(coverage.combinations().len(), 4);
        assert_eq!(
            coverage.combinations()[3],
            Combination {
                gas: "N2O".to_string(),
                sector: "Industrial Processes".to_string()
            }
        );
    }

    #[test]
    fn test_status_lookup() {
        let coverage = coverage();
        assert_eq!(
            coverage.status("EGY", "CH4", "Energy"),
            Some(NdcStatus::NoInformation)
        );
        assert_eq!(coverage.status("SSD", "CO2", "Energy"), Some(NdcStatus::NoNdc));
        assert_eq!(coverage.status("AUT", "CO2", "Energy"), None);
    }

    #[rstest]
    #[case(true, vec![true, true, false, true])]
    #[case(false, vec![true, false, false, true])]
    fn test_coverage_matrix(#[case] optimistic: bool, #[case] egypt: Vec<bool>) {
        let matrix = coverage().coverage_matrix(optimistic);
        assert_eq!(matrix.covered[0], egypt);
        // no NDC is never covered
        assert!(matrix.covered[2].iter().all(|c| !c));
    }

    #[test]
    fn test_share_covered() {
        let share = coverage().coverage_matrix(false).share_covered();
        // EGY and EUU cover CO2 Energy, SSD does not
        assert!((share[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((share[1] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(
            coverage().coverage_matrix(false).sectors(),
            vec!["Energy", "Agriculture", "Industrial Processes"]
        );
    }

    #[test]
    fn test_unknown_entry_rejected() {
        let raw = CsvReader::from_reader(
            "ISO3,CO2 Energy\nEGY,Partly\n".as_bytes(),
            CsvOptions::default(),
        )
        .unwrap();
        assert!(matches!(
            NdcCoverage::from_raw(&raw),
            Err(IoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_header_without_sector_rejected() {
        assert!("CO2".parse::<Combination>().is_err());
        assert_eq!("Covered".parse::<NdcStatus>().unwrap().to_string(), "Covered");
    }
}
