//! Emission factor import from CSV exports
//!
//! Walks a directory for `*.csv` files and loads lines of the form
//! `activity_id,unit,kg_co2e_per_unit[,source]` into the factor store.
//! Header rows, comments and lines that don't parse are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use rusqlite::Connection;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::activity::Unit;
use crate::db;
use crate::models::EmissionFactor;

/// Find all factor files under `dir`
pub fn find_factor_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    files.sort();
    files
}

/// Parses factor lines; built once per import
struct FactorLineParser {
    line_re: Regex,
}

impl FactorLineParser {
    fn new() -> Result<Self> {
        // activity_id, unit, number (plain or exponent form), optional free-text source
        let line_re = Regex::new(
            r#"^\s*"?([A-Za-z0-9_.\-]+)"?\s*,\s*"?(km|kWh|kwh|kg)"?\s*,\s*([0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)\s*(?:,\s*"?([^"]*?)"?\s*)?$"#,
        )?;
        Ok(Self { line_re })
    }

    fn parse(&self, line: &str) -> Option<EmissionFactor> {
        let cap = self.line_re.captures(line)?;
        let unit = Unit::parse(&cap[2])?;
        let kg_co2e_per_unit = cap[3].parse::<f64>().ok()?;
        let source = cap
            .get(4)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());

        Some(EmissionFactor {
            activity_id: cap[1].to_string(),
            unit,
            kg_co2e_per_unit,
            source,
        })
    }
}

fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed.to_ascii_lowercase().starts_with("activity_id")
}

/// Import every factor file under `dir` into the store
pub fn import_factors(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let parser = FactorLineParser::new()?;
    let mut stats = ImportStats::default();

    let files = find_factor_files(dir);
    info!(dir = %dir.display(), files = files.len(), "Scanning for factor files");

    for path in &files {
        let content = match fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display())) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable factor file");
                stats.errors += 1;
                continue;
            }
        };
        stats.files += 1;

        for (lineno, line) in content.lines().enumerate() {
            if is_ignorable(line) {
                continue;
            }
            match parser.parse(line) {
                Some(factor) => {
                    db::upsert_factor(conn, &factor)?;
                    stats.factors += 1;
                }
                None => {
                    warn!(file = %path.display(), line = lineno + 1, "Unparseable factor line");
                    stats.skipped += 1;
                }
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportStats {
    pub files: usize,
    pub factors: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} factors from {} files. Skipped lines: {}, Errors: {}",
            self.factors, self.files, self.skipped, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_quoted_lines() {
        let parser = FactorLineParser::new().unwrap();

        let f = parser.parse("passenger_train-route_type_national_rail-fuel_source_na, km, 0.035").unwrap();
        assert_eq!(f.unit, Unit::Km);
        assert_eq!(f.kg_co2e_per_unit, 0.035);
        assert_eq!(f.source, None);

        let f = parser.parse(r#""grid","kWh",4.2e-1,"National grid 2024""#).unwrap();
        assert_eq!(f.activity_id, "grid");
        assert_eq!(f.unit, Unit::KWh);
        assert!((f.kg_co2e_per_unit - 0.42).abs() < 1e-12);
        assert_eq!(f.source.as_deref(), Some("National grid 2024"));
    }

    #[test]
    fn rejects_unknown_units_and_bad_numbers() {
        let parser = FactorLineParser::new().unwrap();
        assert!(parser.parse("grid,litre,0.4").is_none());
        assert!(parser.parse("grid,kWh,abc").is_none());
        assert!(parser.parse("grid,kWh").is_none());
    }

    #[test]
    fn headers_and_comments_are_ignorable() {
        assert!(is_ignorable("activity_id,unit,kg_co2e_per_unit,source"));
        assert!(is_ignorable("  # exported 2024-01-01"));
        assert!(is_ignorable(""));
        assert!(!is_ignorable("grid,kWh,0.4"));
    }

    #[test]
    fn imports_nested_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2024");
        fs::create_dir(&nested).unwrap();
        fs::write(
            dir.path().join("grid.csv"),
            "activity_id,unit,kg_co2e_per_unit\ngrid,kWh,0.4\n",
        )
        .unwrap();
        fs::write(nested.join("travel.CSV"), "# cars\ncar,km,0.17,defra\nbroken line\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "car,km,99\n").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = import_factors(&conn, dir.path()).unwrap();

        assert_eq!(
            stats,
            ImportStats {
                files: 2,
                factors: 2,
                skipped: 1,
                errors: 0
            }
        );
        let car = db::get_factor(&conn, "car").unwrap().unwrap();
        assert_eq!(car.kg_co2e_per_unit, 0.17);
        assert_eq!(car.source.as_deref(), Some("defra"));
    }
}
