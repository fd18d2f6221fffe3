//! CSV file reader

use crate::reader::{IoError, IoResult, TableReader};
use crate::schema::RawTable;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Options for reading a CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Lines to skip before the header row
    pub skip_lines: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            skip_lines: 0,
        }
    }
}

/// CSV file reader
pub struct CsvReader {
    path: String,
    options: CsvOptions,
}

impl CsvReader {
    /// Open a CSV file
    pub fn open(path: impl AsRef<Path>) -> IoResult<Self> {
        Self::open_with_options(path, CsvOptions::default())
    }

    /// Open a CSV file with options
    pub fn open_with_options(path: impl AsRef<Path>, options: CsvOptions) -> IoResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound(path.display().to_string()));
        }

        Ok(Self {
            path: path.display().to_string(),
            options,
        })
    }

    /// Parse CSV from any reader
    pub fn from_reader<R: Read>(reader: R, options: CsvOptions) -> IoResult<RawTable> {
        let mut buffered = BufReader::new(reader);
        let mut skipped = String::new();
        for _ in 0..options.skip_lines {
            skipped.clear();
            buffered
                .read_line(&mut skipped)
                .map_err(|e| IoError::InvalidFormat(e.to_string()))?;
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(buffered);

        let headers = reader
            .headers()
            .map_err(|e| IoError::InvalidFormat(e.to_string()))?
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| IoError::InvalidFormat(e.to_string()))?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(RawTable::new(headers, rows))
    }
}

impl TableReader for CsvReader {
    fn read_raw(&self) -> IoResult<RawTable> {
        let file = File::open(&self.path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
        let table = Self::from_reader(file, self.options)?;
        tracing::debug!(
            path = %self.path,
            columns = table.headers.len(),
            rows = table.num_rows(),
            "read CSV"
        );
        Ok(table)
    }

    fn path(&self) -> Option<&str> {
        Some(&self.path)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_reader() {
        let data = "country,unit,1990,1991\nDEU,Mt,1.5,2\nFRA,Mt,,3\n";
        let table = CsvReader::from_reader(data.as_bytes(), CsvOptions::default()).unwrap();

        assert_eq!(table.headers, vec!["country", "unit", "1990", "1991"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.rows[1][2], "");
    }

    #[test]
    fn test_skip_preamble() {
        let data = "\"Data Source\",\"WDI\"\n\n\"Last Updated\",\"2023\"\n\nCountry Code,1960\nABW,54608\n";
        let options = CsvOptions {
            skip_lines: 4,
            ..CsvOptions::default()
        };
        let table = CsvReader::from_reader(data.as_bytes(), options).unwrap();

        assert_eq!(table.headers, vec!["Country Code", "1960"]);
        assert_eq!(table.rows, vec![vec!["ABW".to_string(), "54608".to_string()]]);
    }

    #[test]
    fn test_open_missing_file() {
        let err = CsvReader::open("/nonexistent/data.csv").err().unwrap();
        assert!(matches!(err, IoError::FileNotFound(_)));
    }

    #[test]
    fn test_read_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "country;2000").unwrap();
        writeln!(file, "EGY;3.5").unwrap();

        let options = CsvOptions {
            delimiter: b';',
            ..CsvOptions::default()
        };
        let reader = CsvReader::open_with_options(file.path(), options).unwrap();
        let table = reader.read_raw().unwrap();

        assert_eq!(reader.format_name(), "CSV");
        assert_eq!(table.column_values("2000"), Some(vec!["3.5"]));
    }
}
