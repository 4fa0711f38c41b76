//! Stratified train/test partitioning.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::{Dataset, TicketRecord};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplitError {
    #[error("test fraction must be in [0, 1), got {0}")]
    InvalidTestFraction(f64),
}

/// Number of records a group of `n` sends to test.
fn test_count(n: usize, test_fraction: f64, upper: usize) -> usize {
    let raw = (n as f64 * test_fraction).floor() as usize;
    raw.max(1).min(upper)
}

/// Splits `dataset` into `(train, test)`, preserving each category's share.
///
/// Each category is shuffled with its own RNG seeded by `seed`, so adding or
/// removing a category never changes how another one is split. Groups of one
/// record stay entirely in train. When no group is large enough to contribute a
/// test record, the whole dataset is shuffled and split once, ignoring
/// categories.
pub fn split(
    dataset: &Dataset,
    test_fraction: f64,
    seed: u64,
) -> Result<(Dataset, Dataset), SplitError> {
    if !test_fraction.is_finite() || !(0.0..1.0).contains(&test_fraction) {
        return Err(SplitError::InvalidTestFraction(test_fraction));
    }

    let mut groups: BTreeMap<&str, Vec<&TicketRecord>> = BTreeMap::new();
    for record in dataset.records() {
        groups.entry(record.category.as_str()).or_default().push(record);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (category, mut group) in groups {
        let n = group.len();
        if n <= 1 {
            train.extend(group.into_iter().cloned());
            continue;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        group.shuffle(&mut rng);
        let n_test = test_count(n, test_fraction, n - 1);
        debug!("Category '{}': {} train, {} test", category, n - n_test, n_test);

        let (held_out, kept) = group.split_at(n_test);
        test.extend(held_out.iter().map(|r| (*r).clone()));
        train.extend(kept.iter().map(|r| (*r).clone()));
    }

    if test.is_empty() && !dataset.is_empty() {
        warn!("No category has more than one ticket; falling back to an unstratified split");
        return Ok(global_split(dataset, test_fraction, seed));
    }

    info!("Split {} tickets into {} train and {} test", dataset.len(), train.len(), test.len());
    Ok((Dataset::from_records(train), Dataset::from_records(test)))
}

fn global_split(dataset: &Dataset, test_fraction: f64, seed: u64) -> (Dataset, Dataset) {
    let mut records = dataset.records().to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    records.shuffle(&mut rng);

    let n = records.len();
    let n_test = test_count(n, test_fraction, n.saturating_sub(1).max(1));
    let train = records.split_off(n_test);
    (Dataset::from_records(train), Dataset::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn dataset(categories: &[(&str, usize)]) -> Dataset {
        let mut records = Vec::new();
        for (category, count) in categories {
            for i in 0..*count {
                let id = format!("{}-{}", category, i);
                records.push(TicketRecord::new(id.clone(), id, "text", *category));
            }
        }
        Dataset::from_records(records)
    }

    fn ids(dataset: &Dataset) -> Vec<String> {
        dataset.records().iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_keeps_train_nonempty_per_class() {
        let data = dataset(&[("X", 2), ("Y", 2)]);
        let (train, test) = split(&data, 0.5, 0).unwrap();
        assert_eq!(train.categories(), vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(test.len(), 2);
    }

    #[test]
    fn test_is_a_partition() {
        let data = dataset(&[("A", 10), ("B", 7), ("C", 1)]);
        let (train, test) = split(&data, 0.2, 42).unwrap();
        let train_ids: HashSet<String> = ids(&train).into_iter().collect();
        let test_ids: HashSet<String> = ids(&test).into_iter().collect();
        assert!(train_ids.is_disjoint(&test_ids));
        assert_eq!(train_ids.len() + test_ids.len(), data.len());
        assert_eq!(train.len() + test.len(), data.len());
        // floor(10 * 0.2) = 2, floor(7 * 0.2) = 1 -> clamped to 1, C stays in train
        assert_eq!(test.labels().iter().filter(|l| **l == "A").count(), 2);
        assert_eq!(test.labels().iter().filter(|l| **l == "B").count(), 1);
        assert!(train.labels().contains(&"C"));
    }

    #[test]
    fn test_clamps_to_leave_one_in_train() {
        let data = dataset(&[("A", 3)]);
        let (train, test) = split(&data, 0.9, 1).unwrap();
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 2);
    }

    #[test]
    fn test_is_deterministic() {
        let data = dataset(&[("A", 12), ("B", 9), ("C", 5)]);
        let first = split(&data, 0.3, 7).unwrap();
        let second = split(&data, 0.3, 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unrelated_category_does_not_perturb_existing_groups() {
        let base = dataset(&[("A", 12)]);
        let extended = dataset(&[("A", 12), ("B", 6)]);
        let (_, base_test) = split(&base, 0.25, 3).unwrap();
        let (_, extended_test) = split(&extended, 0.25, 3).unwrap();
        let extended_a: Vec<String> = extended_test
            .records()
            .iter()
            .filter(|r| r.category == "A")
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(ids(&base_test), extended_a);
    }

    #[test]
    fn test_all_singletons_fall_back_to_global_split() {
        let data = dataset(&[("A", 1), ("B", 1), ("C", 1), ("D", 1), ("E", 1)]);
        let (train, test) = split(&data, 0.2, 42).unwrap();
        assert_eq!(test.len(), 1);
        assert_eq!(train.len(), 4);
    }

    #[test]
    fn test_empty_dataset() {
        let (train, test) = split(&Dataset::default(), 0.2, 0).unwrap();
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_rejects_invalid_fraction() {
        let data = dataset(&[("A", 4)]);
        assert_eq!(split(&data, 1.0, 0).unwrap_err(), SplitError::InvalidTestFraction(1.0));
        assert!(split(&data, -0.1, 0).is_err());
        assert!(split(&data, f64::NAN, 0).is_err());
    }
}
