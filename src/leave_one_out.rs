use log::debug;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use std::collections::BTreeMap;

use crate::structs::Interaction;

/// Seed used when a shuffle is requested without an explicit seed.
pub const DEFAULT_SHUFFLE_SEED: u64 = 42;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<Interaction>,
    pub test: Vec<Interaction>,
    /// Users left out because they have a single interaction.
    pub dropped_users: usize,
}

/// Holds out the last interaction of every user.
///
/// With `shuffle_seed` the rows are permuted first, so the held-out
/// interaction is a random one. Users are visited in ascending order and
/// users with fewer than two interactions appear in neither set.
pub fn split_train_test(interactions: &[Interaction], shuffle_seed: Option<u64>) -> TrainTestSplit {
    let mut rows = interactions.to_vec();
    if let Some(seed) = shuffle_seed {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        rows.shuffle(&mut rng);
    }

    let mut by_user: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (user, item) in rows {
        by_user.entry(user).or_default().push(item);
    }

    let mut split = TrainTestSplit::default();
    for (user, mut items) in by_user {
        if items.len() < 2 {
            split.dropped_users += 1;
            continue;
        }
        let Some(held_out) = items.pop() else {
            continue;
        };
        split.train.extend(items.into_iter().map(|item| (user, item)));
        split.test.push((user, held_out));
    }

    debug!(
        "leave-one-out: {} train, {} test, {} users dropped",
        split.train.len(),
        split.test.len(),
        split.dropped_users
    );
    split
}
