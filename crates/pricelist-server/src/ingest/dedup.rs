//! Duplicate detection on the identity key
//!
//! A record is a duplicate when its [`IdentityKey`] was already seen earlier in the same batch
//! or is already stored. Duplicates are counted and left out of the insert set.

use std::collections::HashSet;

use super::models::{IdentityKey, PriceRecord};

/// Answers whether an identity key is already persisted
pub trait PersistedLookup {
    fn contains(&self, key: &IdentityKey) -> bool;
}

impl PersistedLookup for HashSet<IdentityKey> {
    fn contains(&self, key: &IdentityKey) -> bool {
        HashSet::contains(self, key)
    }
}

/// Records split into the ones to insert and the number skipped
#[derive(Debug, Default)]
pub struct Classification {
    pub unique: Vec<PriceRecord>,
    pub duplicates: u64,
}

/// Split a batch into unique records and a duplicate count, keeping file order
pub fn classify<L>(records: Vec<PriceRecord>, persisted: &L) -> Classification
where
    L: PersistedLookup + ?Sized,
{
    let mut seen: HashSet<IdentityKey> = HashSet::with_capacity(records.len());
    let mut result = Classification::default();

    for record in records {
        let key = record.identity_key();
        if persisted.contains(&key) || !seen.insert(key) {
            result.duplicates += 1;
            continue;
        }
        result.unique.push(record);
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn record(line: u64, name: &str, price: &str) -> PriceRecord {
        PriceRecord {
            line,
            source_id: line as i64,
            name: name.to_string(),
            category: "fruit".to_string(),
            price: BigDecimal::from_str(price).unwrap(),
            create_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_in_batch_duplicates() {
        let records = vec![
            record(2, "apple", "10.00"),
            record(3, "pear", "10.00"),
            record(4, "apple", "10.00"),
            record(5, "apple", "10.00"),
        ];

        let result = classify(records, &HashSet::new());

        assert_eq!(result.duplicates, 2);
        let lines: Vec<_> = result.unique.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn test_persisted_duplicates() {
        let stored: HashSet<IdentityKey> = [record(0, "apple", "10.00").identity_key()].into();

        let result = classify(
            vec![record(2, "apple", "10.00"), record(3, "apple", "10.00"), record(4, "apple", "11.00")],
            &stored,
        );

        assert_eq!(result.duplicates, 2);
        assert_eq!(result.unique.len(), 1);
        assert_eq!(result.unique[0].line, 4);
    }

    #[test]
    fn test_scale_does_not_matter() {
        let result = classify(
            vec![record(2, "apple", "10"), record(3, "apple", "10.00")],
            &HashSet::new(),
        );
        assert_eq!(result.duplicates, 1);
    }
}
