use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::structs::{Interaction, TestNegative};
use crate::utils::bar_style;

pub const DEFAULT_NUM_NEGATIVES: usize = 99;

/// Draws `num_negatives` unobserved items for every held-out interaction.
///
/// The candidate pool of a user is every item in `0..num_items` that the
/// user has no train or test interaction with. A pool smaller than
/// `num_negatives` is returned whole, in ascending order; otherwise the
/// negatives are drawn uniformly without replacement.
///
/// Each user samples from its own ChaCha20 stream of `seed`, so the output
/// only depends on the seed and the data.
pub fn generate_negative_samples(
    train: &[Interaction],
    test: &[Interaction],
    num_items: usize,
    num_negatives: usize,
    seed: u64,
) -> Result<Vec<TestNegative>> {
    let mut interacted: AHashMap<u32, AHashSet<u32>> = AHashMap::new();
    for &(user, item) in train.iter().chain(test) {
        interacted.entry(user).or_default().insert(item);
    }
    let empty = AHashSet::new();

    let bar = ProgressBar::new(test.len() as u64).with_style(bar_style()?);
    bar.set_message("Generating negatives");

    let negatives = test
        .par_iter()
        .progress_with(bar)
        .map(|&(user, positive)| {
            let seen = interacted.get(&user).unwrap_or(&empty);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            rng.set_stream(u64::from(user));
            TestNegative {
                user,
                positive,
                negatives: sample_unseen(seen, num_items, num_negatives, &mut rng),
            }
        })
        .collect();
    Ok(negatives)
}

fn sample_unseen<R: Rng>(
    seen: &AHashSet<u32>,
    num_items: usize,
    num_negatives: usize,
    rng: &mut R,
) -> Vec<u32> {
    let seen_in_range = seen.iter().filter(|&&i| (i as usize) < num_items).count();
    let pool_size = num_items - seen_in_range;

    if pool_size < num_negatives {
        return (0..num_items as u32)
            .filter(|item| !seen.contains(item))
            .collect();
    }

    // Dense pools are sampled by rejection; sparse ones are materialized
    // so that rejection never loops for long.
    if pool_size >= 2 * num_negatives {
        let mut picked = AHashSet::with_capacity(num_negatives);
        let mut negatives = Vec::with_capacity(num_negatives);
        while negatives.len() < num_negatives {
            let item = rng.random_range(0..num_items as u32);
            if !seen.contains(&item) && picked.insert(item) {
                negatives.push(item);
            }
        }
        negatives
    } else {
        let pool: Vec<u32> = (0..num_items as u32)
            .filter(|item| !seen.contains(item))
            .collect();
        pool.choose_multiple(rng, num_negatives).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(sample: &TestNegative, seen: &[u32], num_items: usize, expected_len: usize) {
        assert_eq!(sample.negatives.len(), expected_len);
        let distinct: AHashSet<_> = sample.negatives.iter().collect();
        assert_eq!(distinct.len(), expected_len, "negatives must be distinct");
        for item in &sample.negatives {
            assert!((*item as usize) < num_items);
            assert!(!seen.contains(item), "item {item} was interacted with");
        }
    }

    #[test]
    fn negatives_exclude_train_and_test_items() {
        let train = vec![(0, 1), (0, 2), (1, 3)];
        let test = vec![(0, 4), (1, 5)];
        let result = generate_negative_samples(&train, &test, 500, 99, 7).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].user, 0);
        assert_eq!(result[0].positive, 4);
        assert_valid(&result[0], &[1, 2, 4], 500, 99);
        assert_valid(&result[1], &[3, 5], 500, 99);
    }

    #[test]
    fn small_pool_is_returned_whole_in_order() {
        let train = vec![(0, 0), (0, 2)];
        let test = vec![(0, 4)];
        let result = generate_negative_samples(&train, &test, 6, 99, 1).unwrap();
        assert_eq!(result[0].negatives, vec![1, 3, 5]);
    }

    #[test]
    fn pool_of_exactly_the_requested_size_is_drawn() {
        // 6 items, 3 seen: the 3 remaining are requested, so they are drawn
        // in random order rather than listed
        let train: Vec<_> = (0..40).flat_map(|u| [(u, 0), (u, 1)]).collect();
        let test: Vec<_> = (0..40).map(|u| (u, 2)).collect();
        let result = generate_negative_samples(&train, &test, 6, 3, 11).unwrap();

        for sample in &result {
            let mut sorted = sample.negatives.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![3, 4, 5]);
        }
        assert!(result.iter().any(|s| s.negatives != vec![3, 4, 5]));
    }

    #[test]
    fn sparse_pool_still_yields_distinct_negatives() {
        // 120 items, 10 seen: the pool of 110 is close to the 99 requested
        let train: Vec<_> = (0..9).map(|i| (3, i)).collect();
        let test = vec![(3, 9)];
        let result = generate_negative_samples(&train, &test, 120, 99, 5).unwrap();
        let seen: Vec<u32> = (0..10).collect();
        assert_valid(&result[0], &seen, 120, 99);
    }

    #[test]
    fn same_seed_gives_same_samples() {
        let train: Vec<_> = (0..50).map(|u| (u, u)).collect();
        let test: Vec<_> = (0..50).map(|u| (u, u + 50)).collect();
        let a = generate_negative_samples(&train, &test, 1000, 20, 42).unwrap();
        let b = generate_negative_samples(&train, &test, 1000, 20, 42).unwrap();
        let c = generate_negative_samples(&train, &test, 1000, 20, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_negatives_requested() {
        let result = generate_negative_samples(&[(0, 0)], &[(0, 1)], 10, 0, 3).unwrap();
        assert!(result[0].negatives.is_empty());
    }
}
