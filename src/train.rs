use ahash::AHashSet;
use anyhow::{Context, Result, anyhow};
use log::warn;
use std::path::Path;

use crate::structs::RawInteraction;

pub const USER_COLUMN: &str = "user_id";
pub const ITEM_COLUMN: &str = "parent_asin";

/// A training split CSV. Columns are located by header name; every other
/// column is carried through untouched.
#[derive(Debug, Clone)]
pub struct TrainSplit {
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
    user_idx: usize,
    item_idx: usize,
}

impl TrainSplit {
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("cannot open train split {}", path.display()))?;
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| anyhow!("{} has no `{name}` column", path.display()))
        };
        let user_idx = column(USER_COLUMN)?;
        let item_idx = column(ITEM_COLUMN)?;

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("malformed row in {}", path.display()))?;

        Ok(Self {
            headers,
            rows,
            user_idx,
            item_idx,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn field<'a>(&self, row: &'a csv::StringRecord, idx: usize) -> &'a str {
        row.get(idx).unwrap_or_default()
    }

    pub fn interactions(&self) -> Vec<RawInteraction> {
        self.rows
            .iter()
            .map(|row| {
                RawInteraction::new(
                    self.field(row, self.user_idx),
                    self.field(row, self.item_idx),
                )
            })
            .collect()
    }

    pub fn item_ids(&self) -> AHashSet<String> {
        self.rows
            .iter()
            .map(|row| self.field(row, self.item_idx).to_owned())
            .collect()
    }

    pub fn user_ids(&self) -> AHashSet<String> {
        self.rows
            .iter()
            .map(|row| self.field(row, self.user_idx).to_owned())
            .collect()
    }

    /// Writes the rows whose item is in `asins`, header first. Returns the
    /// number of rows written.
    pub fn write_filtered(&self, path: &Path, asins: &AHashSet<String>) -> Result<usize> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        writer.write_record(&self.headers)?;
        let mut written = 0;
        for row in &self.rows {
            if asins.contains(self.field(row, self.item_idx)) {
                writer.write_record(row)?;
                written += 1;
            }
        }
        writer.flush()?;
        Ok(written)
    }
}

/// Item ids of a training split, or an empty set when the split does not
/// exist (every review is then filtered out).
pub fn load_train_asins(path: &Path) -> Result<AHashSet<String>> {
    if !path.exists() {
        warn!(
            "train split {} not found, no record will be kept",
            path.display()
        );
        return Ok(AHashSet::new());
    }
    Ok(TrainSplit::load(path)?.item_ids())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SPLIT: &str = "rating,parent_asin,user_id,timestamp\n\
        5.0,B01,U1,100\n\
        4.0,B02,U1,200\n\
        3.0,B01,U2,300\n";

    #[test]
    fn columns_are_found_by_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, SPLIT).unwrap();

        let split = TrainSplit::load(&path).unwrap();
        assert_eq!(split.len(), 3);
        assert_eq!(
            split.interactions()[1],
            RawInteraction::new("U1", "B02")
        );
        assert_eq!(split.item_ids().len(), 2);
        assert_eq!(split.user_ids().len(), 2);
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, "user_id,rating\nU1,5\n").unwrap();

        let err = TrainSplit::load(&path).unwrap_err();
        assert!(err.to_string().contains("parent_asin"));
    }

    #[test]
    fn filtered_copy_keeps_all_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, SPLIT).unwrap();
        let split = TrainSplit::load(&path).unwrap();

        let keep: AHashSet<String> = ["B01".to_string()].into_iter().collect();
        let out = dir.path().join("out.csv");
        assert_eq!(split.write_filtered(&out, &keep).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "rating,parent_asin,user_id,timestamp\n5.0,B01,U1,100\n3.0,B01,U2,300\n"
        );
    }

    #[test]
    fn absent_split_yields_no_asins() {
        let dir = tempdir().unwrap();
        let asins = load_train_asins(&dir.path().join("nope.csv")).unwrap();
        assert!(asins.is_empty());
    }
}
