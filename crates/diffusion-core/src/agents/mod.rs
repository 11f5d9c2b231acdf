//! Agent identity and state.
//!
//! An agent is one network participant: a unique id, a fixed-length state
//! vector, a materialized predecessor list, and a monotonically increasing
//! update count. Identity, equality, and hashing are defined by id alone so
//! agents can serve as graph-node keys.

pub mod attitude;
pub mod binary;

use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

/// Unique, monotonically assigned agent identifier.
///
/// Ids are allocated in creation order and never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(u64);

impl AgentId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run-scoped id allocator.
///
/// Owned by the network builder rather than living in global state, so ids
/// cannot leak across simulation runs.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id. Strictly increasing, never reused.
    pub fn next_id(&mut self) -> AgentId {
        let id = AgentId(self.next);
        self.next += 1;
        id
    }
}

/// Behavioral variant of an agent, fixed at network construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Single 0/1 scalar state, updated in-process by a majority rule.
    Binary,
    /// Two equal-length banks of numeric units, updated by the external
    /// inference collaborator.
    Attitude { units_per_bank: usize },
}

impl AgentKind {
    /// Fixed state-vector length for this variant.
    pub fn state_len(&self) -> usize {
        match self {
            AgentKind::Binary => 1,
            AgentKind::Attitude { units_per_bank } => 2 * units_per_bank,
        }
    }

    /// The variant's zero value: an all-zero vector of the fixed length.
    pub fn zero_state(&self) -> Vec<f64> {
        vec![0.0; self.state_len()]
    }
}

/// Errors from agent state mutation. All are detected before any mutation,
/// so a failed call leaves the agent unchanged.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("state value {value} is outside {{0, 1}}")]
    InvalidState { value: u8 },
    #[error("state is already {value}; redundant transitions are rejected")]
    RedundantTransition { value: u8 },
    #[error("replacement state has length {got}, expected {expected}")]
    StateLength { expected: usize, got: usize },
    #[error("update count must increase: current {current}, requested {requested}")]
    UpdateCountRegression { current: u64, requested: u64 },
}

/// One simulated network participant.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    state: Vec<f64>,
    predecessors: Option<Vec<AgentId>>,
    update_count: u64,
    last_influencer: Option<AgentId>,
}

impl Agent {
    /// Create an agent with the variant's zero state.
    pub fn new(id: AgentId, kind: AgentKind) -> Self {
        Self {
            id,
            kind,
            state: kind.zero_state(),
            predecessors: None,
            update_count: 0,
            last_influencer: None,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Current state. Mutation goes through [`Agent::set_state`] only.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Replace the state vector by value.
    ///
    /// Fails if the replacement length differs from the fixed length chosen
    /// at construction. Does not touch the update count; the update protocol
    /// couples state commits with the count increment.
    pub fn set_state(&mut self, new_state: Vec<f64>) -> Result<(), AgentError> {
        if new_state.len() != self.state.len() {
            return Err(AgentError::StateLength {
                expected: self.state.len(),
                got: new_state.len(),
            });
        }
        self.state = new_state;
        Ok(())
    }

    /// Set the update count to a strictly larger value.
    pub fn set_update_count(&mut self, value: u64) -> Result<(), AgentError> {
        if value <= self.update_count {
            return Err(AgentError::UpdateCountRegression {
                current: self.update_count,
                requested: value,
            });
        }
        self.update_count = value;
        Ok(())
    }

    /// Store the ordered predecessor list. Called once per agent during
    /// network setup, after all edges exist.
    pub fn set_predecessors(&mut self, ids: Vec<AgentId>) {
        self.predecessors = Some(ids);
    }

    /// Ordered predecessor ids; empty if none were assigned.
    pub fn predecessors(&self) -> &[AgentId] {
        self.predecessors.as_deref().unwrap_or(&[])
    }

    /// True iff at least one predecessor is assigned. Never errors, even
    /// before assignment.
    pub fn has_predecessors(&self) -> bool {
        !self.predecessors().is_empty()
    }

    /// Per-step transient: the single agent whose state drove the latest
    /// update, when the selection policy picked exactly one.
    pub fn last_influencer(&self) -> Option<AgentId> {
        self.last_influencer
    }

    pub(crate) fn set_last_influencer(&mut self, id: AgentId) {
        self.last_influencer = Some(id);
    }

    pub(crate) fn clear_last_influencer(&mut self) {
        self.last_influencer = None;
    }
}

impl PartialEq for Agent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Agent {}

impl Hash for Agent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    fn hash_of(agent: &Agent) -> u64 {
        let mut hasher = DefaultHasher::new();
        agent.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_allocator_ids_increase_in_creation_order() {
        let mut allocator = IdAllocator::new();
        let agents: Vec<Agent> = (0..10)
            .map(|_| Agent::new(allocator.next_id(), AgentKind::Binary))
            .collect();

        assert_eq!(agents[0].id().value(), 0);
        assert_eq!(agents[9].id().value(), 9);
        for pair in agents.windows(2) {
            assert!(pair[0].id() < pair[1].id());
        }

        let unique: HashSet<AgentId> = agents.iter().map(|a| a.id()).collect();
        assert_eq!(unique.len(), agents.len());
    }

    #[test]
    fn test_equality_and_hash_by_id_only() {
        let a = Agent::new(AgentId::new(3), AgentKind::Binary);
        let mut b = Agent::new(AgentId::new(3), AgentKind::Attitude { units_per_bank: 2 });
        b.set_update_count(5).unwrap();

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = Agent::new(AgentId::new(4), AgentKind::Binary);
        assert_ne!(a, c);
    }

    #[test]
    fn test_new_agent_has_zero_state() {
        let binary = Agent::new(AgentId::new(0), AgentKind::Binary);
        assert_eq!(binary.state(), &[0.0]);

        let attitude = Agent::new(AgentId::new(1), AgentKind::Attitude { units_per_bank: 3 });
        assert_eq!(attitude.state(), &[0.0; 6]);
    }

    #[test]
    fn test_set_state_rejects_length_mismatch_without_mutating() {
        let mut agent = Agent::new(AgentId::new(0), AgentKind::Attitude { units_per_bank: 2 });
        agent.set_state(vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        let result = agent.set_state(vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(AgentError::StateLength { expected: 4, got: 2 })
        ));
        assert_eq!(agent.state(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_set_state_copies_by_value() {
        let mut agent = Agent::new(AgentId::new(0), AgentKind::Attitude { units_per_bank: 2 });
        let mut buffer = vec![1.0, 2.0, 3.0, 4.0];
        agent.set_state(buffer.clone()).unwrap();
        buffer[0] = 9.0;
        assert_eq!(agent.state()[0], 1.0);
    }

    #[test]
    fn test_update_count_must_increase() {
        let mut agent = Agent::new(AgentId::new(0), AgentKind::Binary);
        agent.set_update_count(1).unwrap();
        agent.set_update_count(2).unwrap();

        assert!(matches!(
            agent.set_update_count(2),
            Err(AgentError::UpdateCountRegression { current: 2, requested: 2 })
        ));
        assert!(matches!(
            agent.set_update_count(1),
            Err(AgentError::UpdateCountRegression { .. })
        ));
        assert_eq!(agent.update_count(), 2);
    }

    #[test]
    fn test_has_predecessors_safe_before_assignment() {
        let mut agent = Agent::new(AgentId::new(0), AgentKind::Binary);
        assert!(!agent.has_predecessors());
        assert!(agent.predecessors().is_empty());

        agent.set_predecessors(vec![]);
        assert!(!agent.has_predecessors());

        agent.set_predecessors(vec![AgentId::new(1), AgentId::new(2)]);
        assert!(agent.has_predecessors());
        assert_eq!(agent.predecessors().len(), 2);
    }
}
