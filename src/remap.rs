use ahash::AHashMap;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use crate::structs::{Interaction, RawInteraction};
use crate::utils::write_json_file;

/// Dense ids for raw user and item identifiers. Ids follow the
/// lexicographic order of the raw identifiers and start at 0.
#[derive(Debug, Clone, Default)]
pub struct IdMaps {
    user2id: AHashMap<String, u32>,
    item2id: AHashMap<String, u32>,
}

fn dense_ids<'a>(raw: impl Iterator<Item = &'a str>) -> AHashMap<String, u32> {
    let mut sorted: Vec<&str> = raw.collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, id)| (id.to_owned(), idx as u32))
        .collect()
}

impl IdMaps {
    pub fn build(frames: &[&[RawInteraction]]) -> Self {
        let rows = || frames.iter().flat_map(|frame| frame.iter());
        Self {
            user2id: dense_ids(rows().map(|r| r.user_id.as_str())),
            item2id: dense_ids(rows().map(|r| r.parent_asin.as_str())),
        }
    }

    pub fn num_users(&self) -> usize {
        self.user2id.len()
    }

    pub fn num_items(&self) -> usize {
        self.item2id.len()
    }

    pub fn user_id(&self, raw: &str) -> Option<u32> {
        self.user2id.get(raw).copied()
    }

    pub fn item_id(&self, raw: &str) -> Option<u32> {
        self.item2id.get(raw).copied()
    }

    /// Maps rows to dense pairs, dropping rows with an unknown user or
    /// item. Row order is preserved.
    pub fn convert(&self, rows: &[RawInteraction]) -> Vec<Interaction> {
        rows.iter()
            .filter_map(|row| {
                let user = self.user_id(&row.user_id)?;
                let item = self.item_id(&row.parent_asin)?;
                Some((user, item))
            })
            .collect()
    }

    /// Writes `{category}_user2id.json` and `{category}_item2id.json` into
    /// `dir`, keys sorted.
    pub fn save(&self, dir: &Path, category: &str) -> Result<()> {
        fn sorted(map: &AHashMap<String, u32>) -> BTreeMap<&str, u32> {
            map.iter().map(|(k, v)| (k.as_str(), *v)).collect()
        }
        write_json_file(
            &dir.join(format!("{category}_user2id.json")),
            &sorted(&self.user2id),
            2,
        )?;
        write_json_file(
            &dir.join(format!("{category}_item2id.json")),
            &sorted(&self.item2id),
            2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::tempdir;

    fn rows() -> Vec<RawInteraction> {
        vec![
            RawInteraction::new("bob", "B02"),
            RawInteraction::new("alice", "B02"),
            RawInteraction::new("bob", "B01"),
        ]
    }

    #[test]
    fn ids_follow_sorted_order() {
        let rows = rows();
        let maps = IdMaps::build(&[rows.as_slice()]);
        assert_eq!(maps.num_users(), 2);
        assert_eq!(maps.num_items(), 2);
        assert_eq!(maps.user_id("alice"), Some(0));
        assert_eq!(maps.user_id("bob"), Some(1));
        assert_eq!(maps.item_id("B01"), Some(0));
        assert_eq!(maps.convert(&rows), vec![(1, 1), (0, 1), (1, 0)]);
    }

    #[test]
    fn frames_share_one_id_space() {
        let first = vec![RawInteraction::new("u2", "i2")];
        let second = vec![RawInteraction::new("u1", "i1")];
        let maps = IdMaps::build(&[first.as_slice(), second.as_slice()]);
        assert_eq!(maps.user_id("u1"), Some(0));
        assert_eq!(maps.convert(&first), vec![(1, 1)]);
    }

    #[test]
    fn unknown_rows_are_dropped() {
        let rows = rows();
        let maps = IdMaps::build(&[rows.as_slice()]);
        let other = vec![
            RawInteraction::new("carol", "B01"),
            RawInteraction::new("alice", "B99"),
            RawInteraction::new("alice", "B01"),
        ];
        assert_eq!(maps.convert(&other), vec![(0, 0)]);
    }

    #[test]
    fn mappings_are_written_as_json_objects() {
        let dir = tempdir().unwrap();
        let rows = rows();
        IdMaps::build(&[rows.as_slice()]).save(dir.path(), "Toys").unwrap();

        let text = fs::read_to_string(dir.path().join("Toys_user2id.json")).unwrap();
        assert_eq!(text, "{\n  \"alice\": 0,\n  \"bob\": 1\n}");
        let items: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("Toys_item2id.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(items, json!({"B01": 0, "B02": 1}));
    }
}
