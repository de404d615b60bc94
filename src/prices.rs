//! Bulk price-list import from CSV
//!
//! Reads rows of `id,category,name,unit,price` and upserts them into the
//! resource catalog. Rows for existing ids may leave category, name and unit
//! blank to keep the current values.

use std::path::Path;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use crate::catalog::Upsert;
use crate::error::{RabError, Result};
use crate::models::Resource;
use crate::project::Project;

/// Optional `Rp` prefix, then either a dot-grouped integer (`1.234.567`)
/// or a plain number with an optional `.`/`,` decimal part.
const PRICE_PATTERN: &str =
    r"^(?:Rp\.?\s*)?(?:(?P<grouped>\d{1,3}(?:\.\d{3})+)|(?P<plain>\d+(?:[.,]\d+)?))$";

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    price: String,
}

/// Reads price cells: `107000`, `12457.5`, `12457,5`, `Rp 1.516`
pub struct PriceParser {
    re: Regex,
}

impl PriceParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(PRICE_PATTERN)?,
        })
    }

    pub fn parse(&self, text: &str) -> Option<Decimal> {
        let caps = self.re.captures(text.trim())?;
        if let Some(grouped) = caps.name("grouped") {
            return grouped.as_str().replace('.', "").parse().ok();
        }
        caps.name("plain")?.as_str().replace(',', ".").parse().ok()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Import a price list file into the project's catalog
pub fn import_price_list(project: &mut Project, path: &Path) -> Result<ImportStats> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let stats = import_from_reader(project, reader)?;
    info!(path = %path.display(), %stats, "price list imported");
    Ok(stats)
}

fn import_from_reader<R: std::io::Read>(project: &mut Project, mut reader: csv::Reader<R>) -> Result<ImportStats> {
    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == "id") || !headers.iter().any(|h| h == "price") {
        return Err(RabError::malformed(
            "price list needs at least 'id' and 'price' columns",
        ));
    }

    let prices = PriceParser::new()?;
    let mut stats = ImportStats::default();

    for (line, row) in reader.deserialize::<PriceRow>().enumerate() {
        let row_no = line + 2; // header is row 1
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(row = row_no, error = %e, "unreadable price row skipped");
                stats.skipped += 1;
                continue;
            }
        };

        if row.id.is_empty() {
            warn!(row = row_no, "price row without id skipped");
            stats.skipped += 1;
            continue;
        }
        let Some(price) = prices.parse(&row.price) else {
            warn!(row = row_no, id = %row.id, price = %row.price, "price row with bad price skipped");
            stats.skipped += 1;
            continue;
        };

        let existing = project.catalog.get(&row.id);
        let keep = |new: String, old: Option<&String>| {
            if new.is_empty() {
                old.cloned().unwrap_or_default()
            } else {
                new
            }
        };
        let resource = Resource {
            category: keep(row.category, existing.map(|r| &r.category)),
            name: keep(row.name, existing.map(|r| &r.name)),
            unit: keep(row.unit, existing.map(|r| &r.unit)),
            id: row.id,
            price,
        };

        match project.upsert_resource(resource) {
            Ok(Upsert::Inserted) => stats.inserted += 1,
            Ok(Upsert::Updated) => stats.updated += 1,
            Err(e) => {
                warn!(row = row_no, error = %e, "price row rejected");
                stats.skipped += 1;
            }
        }
    }

    Ok(stats)
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} new and {} updated resources. Skipped: {}",
            self.inserted, self.updated, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_project;
    use std::io::Write;

    #[test]
    fn price_formats() {
        let prices = PriceParser::new().unwrap();
        let parse_price = |text: &str| prices.parse(text);
        assert_eq!(parse_price("107000"), Some(Decimal::from(107_000)));
        assert_eq!(parse_price("12457.5"), Some(Decimal::new(124_575, 1)));
        assert_eq!(parse_price("12457,5"), Some(Decimal::new(124_575, 1)));
        assert_eq!(parse_price("Rp 1.516"), Some(Decimal::from(1_516)));
        assert_eq!(parse_price("Rp. 2.407.000"), Some(Decimal::from(2_407_000)));
        assert_eq!(parse_price(" 43300 "), Some(Decimal::from(43_300)));
        assert_eq!(parse_price("-5"), None);
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn import_updates_inserts_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harga.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "id,category,name,unit,price").unwrap();
        writeln!(file, "L.01,,,,120000").unwrap();
        writeln!(file, "M.99,Bahan,Besi Hollow,Btg,\"Rp 45.000\"").unwrap();
        writeln!(file, ",Bahan,No Id,Kg,100").unwrap();
        writeln!(file, "M.01,Bahan,Semen,Kg,murah").unwrap();
        drop(file);

        let mut project = sample_project();
        let before = project.recipe_price("AHSP.T.01");
        let stats = import_price_list(&mut project, &path).unwrap();

        assert_eq!(
            stats,
            ImportStats {
                inserted: 1,
                updated: 1,
                skipped: 2
            }
        );
        let pekerja = project.catalog.get("L.01").unwrap();
        assert_eq!(pekerja.price, Decimal::from(120_000));
        assert_eq!(pekerja.name, "Pekerja");
        assert_eq!(project.catalog.get("M.99").unwrap().unit, "Btg");
        assert_eq!(project.catalog.price("M.01"), Some(Decimal::from(1516)));

        // 0.75 x (120000 - 107000)
        let after = project.recipe_price("AHSP.T.01");
        assert_eq!(after - before, Decimal::from(9_750));
    }

    #[test]
    fn missing_columns_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "kode,harga\nL.01,1\n").unwrap();

        let mut project = sample_project();
        assert!(matches!(
            import_price_list(&mut project, &path),
            Err(RabError::MalformedDocument { .. })
        ));
    }
}
