use serde::{Deserialize, Serialize};

/// One row of a training split, with the raw Amazon identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawInteraction {
    pub user_id: String,
    pub parent_asin: String,
}

impl RawInteraction {
    pub fn new(user_id: impl Into<String>, parent_asin: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            parent_asin: parent_asin.into(),
        }
    }
}

/// `(user, item)` after remapping to dense ids.
pub type Interaction = (u32, u32);

/// A held-out positive together with the sampled negatives of its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestNegative {
    pub user: u32,
    pub positive: u32,
    pub negatives: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreprocessReport {
    pub category: String,
    pub users: usize,
    pub items: usize,
    pub train_pairs: usize,
    pub test_pairs: usize,
    pub dropped_users: usize,
}
