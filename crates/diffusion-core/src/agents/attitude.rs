//! Attitude agent behavior.
//!
//! An attitude agent's state vector splits into two equal-length banks of
//! processing units (positive and negative valence). The state transition is
//! not computed locally: the update protocol hands the agent and its selected
//! predecessors to the external inference collaborator and commits whatever
//! full-length vector comes back.

use super::{Agent, AgentKind};

impl Agent {
    /// Units per bank, for attitude agents.
    pub fn units_per_bank(&self) -> Option<usize> {
        match self.kind() {
            AgentKind::Attitude { units_per_bank } => Some(units_per_bank),
            AgentKind::Binary => None,
        }
    }

    /// The two state banks as (positive, negative) slices, for attitude
    /// agents.
    pub fn banks(&self) -> Option<(&[f64], &[f64])> {
        let units = self.units_per_bank()?;
        Some(self.state().split_at(units))
    }
}
