//! Reference policy
//!
//! Uniform choice over the action catalog. Used by the runner and tests in
//! place of a learning agent.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::Result;
use crate::processor::ActionCatalog;
use dialogue_sim_core::DialogAct;

pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Pick an action index; the state is ignored
    pub fn select_index(&mut self, _state: &[f32], catalog: &ActionCatalog) -> usize {
        if catalog.is_empty() {
            return 0;
        }
        self.rng.gen_range(0..catalog.len())
    }

    /// Pick an action and resolve it through the catalog
    pub fn act(&mut self, state: &[f32], catalog: &ActionCatalog) -> Result<DialogAct> {
        let index = self.select_index(state, catalog);
        catalog.process_action(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_within_catalog() {
        let catalog = ActionCatalog::standard(["price", "area"], ["phone"]);
        let mut policy = RandomPolicy::new(3);
        for _ in 0..200 {
            assert!(policy.select_index(&[], &catalog) < catalog.len());
        }
    }

    #[test]
    fn test_same_seed_same_choices() {
        let catalog = ActionCatalog::standard(["price", "area"], ["phone"]);
        let mut a = RandomPolicy::new(11);
        let mut b = RandomPolicy::new(11);
        let picks_a: Vec<usize> = (0..20).map(|_| a.select_index(&[], &catalog)).collect();
        let picks_b: Vec<usize> = (0..20).map(|_| b.select_index(&[], &catalog)).collect();
        assert_eq!(picks_a, picks_b);
    }
}
