//! Binary agent behavior.
//!
//! A binary agent holds a single 0/1 scalar and updates in-process: the new
//! state is the majority of the selected predecessor states, with ties
//! keeping the agent's current state.

use rand::Rng;

use super::{Agent, AgentError};

impl Agent {
    /// Current binary state as 0 or 1. Meaningful for binary agents, whose
    /// state vector is a single scalar.
    pub fn binary_state(&self) -> u8 {
        if self.state()[0] >= 0.5 {
            1
        } else {
            0
        }
    }

    /// Set the binary state.
    ///
    /// Rejects values outside {0, 1} and redundant transitions to the
    /// current value, so callers are forced to notice no-op updates.
    pub fn set_binary_state(&mut self, value: u8) -> Result<(), AgentError> {
        if value > 1 {
            return Err(AgentError::InvalidState { value });
        }
        if value == self.binary_state() {
            return Err(AgentError::RedundantTransition { value });
        }
        self.set_state(vec![f64::from(value)])
    }
}

/// Draw a random binary state: 0 with probability 0.5, else 1, from a
/// uniform draw on [0, 1).
pub fn random_binary_state<R: Rng>(rng: &mut R) -> u8 {
    if rng.gen::<f64>() < 0.5 {
        0
    } else {
        1
    }
}

/// Majority rule over the selected predecessor states.
///
/// Returns 1.0 if more than half the influences are set, 0.0 if fewer, and
/// the agent's own state on a tie (including an empty influence set).
pub fn majority(own_state: f64, influences: &[f64]) -> f64 {
    let ones = influences.iter().filter(|&&v| v >= 0.5).count();
    let zeros = influences.len() - ones;
    if ones > zeros {
        1.0
    } else if zeros > ones {
        0.0
    } else {
        own_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentId, AgentKind};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn binary_agent() -> Agent {
        Agent::new(AgentId::new(0), AgentKind::Binary)
    }

    #[test]
    fn test_set_binary_state_rejects_out_of_domain() {
        let mut agent = binary_agent();
        for value in [2u8, 7, 255] {
            assert!(matches!(
                agent.set_binary_state(value),
                Err(AgentError::InvalidState { .. })
            ));
        }
        assert_eq!(agent.binary_state(), 0);
    }

    #[test]
    fn test_set_binary_state_rejects_redundant_transition() {
        let mut agent = binary_agent();
        assert!(matches!(
            agent.set_binary_state(0),
            Err(AgentError::RedundantTransition { value: 0 })
        ));

        agent.set_binary_state(1).unwrap();
        assert!(matches!(
            agent.set_binary_state(1),
            Err(AgentError::RedundantTransition { value: 1 })
        ));
        assert_eq!(agent.binary_state(), 1);
    }

    #[test]
    fn test_set_binary_state_flips() {
        let mut agent = binary_agent();
        agent.set_binary_state(1).unwrap();
        assert_eq!(agent.binary_state(), 1);
        agent.set_binary_state(0).unwrap();
        assert_eq!(agent.binary_state(), 0);
    }

    #[test]
    fn test_random_binary_state_in_domain() {
        let mut rng = SmallRng::seed_from_u64(42);
        let draws: Vec<u8> = (0..100).map(|_| random_binary_state(&mut rng)).collect();
        assert!(draws.iter().all(|&v| v == 0 || v == 1));
        // With 100 seeded draws both values show up.
        assert!(draws.contains(&0));
        assert!(draws.contains(&1));
    }

    #[test]
    fn test_random_binary_state_deterministic_per_seed() {
        let mut rng1 = SmallRng::seed_from_u64(7);
        let mut rng2 = SmallRng::seed_from_u64(7);
        let a: Vec<u8> = (0..50).map(|_| random_binary_state(&mut rng1)).collect();
        let b: Vec<u8> = (0..50).map(|_| random_binary_state(&mut rng2)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_majority_rule() {
        assert_eq!(majority(0.0, &[1.0]), 1.0);
        assert_eq!(majority(1.0, &[0.0]), 0.0);
        assert_eq!(majority(0.0, &[1.0, 1.0, 0.0]), 1.0);
        assert_eq!(majority(1.0, &[0.0, 0.0, 1.0]), 0.0);
        // Ties keep the current state.
        assert_eq!(majority(0.0, &[1.0, 0.0]), 0.0);
        assert_eq!(majority(1.0, &[1.0, 0.0]), 1.0);
        assert_eq!(majority(1.0, &[]), 1.0);
    }
}
