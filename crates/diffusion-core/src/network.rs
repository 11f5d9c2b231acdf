//! Network orchestrator.
//!
//! Owns the directed multigraph of agents and drives simulation progress:
//! sampling without replacement, running the update protocol over a batch
//! under either timing discipline, seeding initial state, and exporting
//! per-step records to the step log.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use petgraph::dot::{Config as DotConfig, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use diffusion_log::{StepLogger, StepRecord};

use crate::agents::{binary, Agent, AgentError, AgentId, AgentKind, IdAllocator};
use crate::inference::{BatchSpec, Inference, InferenceConfig};
use crate::protocol::{self, SelectionPolicy, UpdateDiscipline, UpdateError};

/// Errors from network construction and orchestration.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("sample of {requested} agents exceeds network size {available}")]
    SampleSize { requested: usize, available: usize },
    #[error("agent id {0} is already registered")]
    AssignAgentId(AgentId),
    #[error("no agent with id {0}")]
    UnknownAgent(AgentId),
    #[error("edge endpoint {0} does not name a created agent")]
    UnknownEndpoint(u64),
    #[error(transparent)]
    Update(#[from] UpdateError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("step log write failed: {0}")]
    Log(#[from] std::io::Error),
}

/// Outcome tallies for one driven batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Agents sampled for this step.
    pub sampled: usize,
    /// Agents whose state changed and was committed.
    pub updated: usize,
    /// Agents whose computed state equaled their current state.
    pub unchanged: usize,
    /// Agents skipped because they have no predecessors.
    pub skipped: usize,
}

/// Result of the compute phase for one agent. Nothing is committed yet.
enum Computed {
    NoPredecessors,
    Unchanged { influencer: Option<AgentId> },
    New {
        state: Vec<f64>,
        influencer: Option<AgentId>,
    },
}

/// Configures and builds a [`Network`].
///
/// The behavioral variant is chosen here, once, for the whole run; attitude
/// networks must be given an inference adapter before building.
pub struct NetworkBuilder {
    kind: AgentKind,
    inference: Option<Box<dyn Inference>>,
    inference_config: InferenceConfig,
}

impl NetworkBuilder {
    pub fn new(kind: AgentKind) -> Self {
        Self {
            kind,
            inference: None,
            inference_config: InferenceConfig::default(),
        }
    }

    /// Attach the inference collaborator used by attitude agents.
    pub fn with_inference(
        mut self,
        adapter: Box<dyn Inference>,
        config: InferenceConfig,
    ) -> Self {
        self.inference = Some(adapter);
        self.inference_config = config;
        self
    }

    /// Create all agents, wire the topology, and materialize predecessor
    /// lists.
    ///
    /// Edge endpoints index agents by creation order; an edge (u, v) makes u
    /// a predecessor of v. Parallel edges are kept in the graph but each
    /// unique predecessor appears once in an agent's list.
    pub fn build(
        self,
        agent_count: usize,
        edges: &[(u64, u64)],
    ) -> Result<Network, NetworkError> {
        let mut allocator = IdAllocator::new();
        let mut graph = DiGraph::<AgentId, ()>::new();
        let mut node_idx: HashMap<AgentId, NodeIndex> = HashMap::new();
        let mut agents: BTreeMap<AgentId, Agent> = BTreeMap::new();

        for _ in 0..agent_count {
            let id = allocator.next_id();
            if agents.contains_key(&id) {
                return Err(NetworkError::AssignAgentId(id));
            }
            let idx = graph.add_node(id);
            node_idx.insert(id, idx);
            agents.insert(id, Agent::new(id, self.kind));
        }
        debug!(count = agent_count, "created agents");

        for &(u, v) in edges {
            let ui = *node_idx
                .get(&AgentId::new(u))
                .ok_or(NetworkError::UnknownEndpoint(u))?;
            let vi = *node_idx
                .get(&AgentId::new(v))
                .ok_or(NetworkError::UnknownEndpoint(v))?;
            graph.add_edge(ui, vi, ());
        }

        // Materialize predecessor lists once, in edge insertion order, each
        // unique predecessor appearing once.
        let mut predecessors: HashMap<AgentId, Vec<AgentId>> = HashMap::new();
        for edge in graph.edge_references() {
            let source = graph[edge.source()];
            let target = graph[edge.target()];
            let list = predecessors.entry(target).or_default();
            if !list.contains(&source) {
                list.push(source);
            }
        }
        for (id, agent) in agents.iter_mut() {
            agent.set_predecessors(predecessors.remove(id).unwrap_or_default());
        }

        Ok(Network {
            graph,
            node_idx,
            agents,
            inference: self.inference,
            inference_config: self.inference_config,
        })
    }
}

/// The simulated network: graph topology plus the agent identity map.
///
/// Invariant: the graph's node set and the identity map stay in sync; every
/// node carries the id of exactly one agent in the map. Agents are created
/// in bulk at build time and never removed.
pub struct Network {
    graph: DiGraph<AgentId, ()>,
    node_idx: HashMap<AgentId, NodeIndex>,
    agents: BTreeMap<AgentId, Agent>,
    inference: Option<Box<dyn Inference>>,
    inference_config: InferenceConfig,
}

impl Network {
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// All agent ids in ascending order.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Sample `k` distinct agents uniformly at random.
    pub fn sample_without_replacement(
        &self,
        k: usize,
        rng: &mut SmallRng,
    ) -> Result<Vec<AgentId>, NetworkError> {
        if k > self.agents.len() {
            return Err(NetworkError::SampleSize {
                requested: k,
                available: self.agents.len(),
            });
        }
        let candidates: Vec<AgentId> = self.agents.keys().copied().collect();
        Ok(candidates.choose_multiple(rng, k).copied().collect())
    }

    /// Force an initial binary state before the run begins. Bypasses the
    /// update protocol; the update count does not move.
    pub fn seed_binary(&mut self, id: AgentId, value: u8) -> Result<(), NetworkError> {
        let agent = self
            .agents
            .get_mut(&id)
            .ok_or(NetworkError::UnknownAgent(id))?;
        agent.set_binary_state(value)?;
        Ok(())
    }

    /// Force an initial state vector before the run begins, without moving
    /// the update count. Used to plant attitude prototypes.
    pub fn seed_state(&mut self, id: AgentId, state: Vec<f64>) -> Result<(), NetworkError> {
        let agent = self
            .agents
            .get_mut(&id)
            .ok_or(NetworkError::UnknownAgent(id))?;
        agent.set_state(state)?;
        Ok(())
    }

    /// One unit of simulation progress: sample `k` agents, then drive the
    /// update protocol across the batch.
    pub fn step(
        &mut self,
        discipline: UpdateDiscipline,
        policy: SelectionPolicy,
        k: usize,
        rng: &mut SmallRng,
    ) -> Result<StepReport, NetworkError> {
        let sampled = self.sample_without_replacement(k, rng)?;
        self.run_batch(&sampled, discipline, policy, rng)
    }

    /// Drive the update protocol over an explicit batch, in batch order.
    pub fn run_batch(
        &mut self,
        sampled: &[AgentId],
        discipline: UpdateDiscipline,
        policy: SelectionPolicy,
        rng: &mut SmallRng,
    ) -> Result<StepReport, NetworkError> {
        let mut report = StepReport {
            sampled: sampled.len(),
            ..StepReport::default()
        };

        match discipline {
            UpdateDiscipline::Sequential => {
                for &id in sampled {
                    let computed = self.compute_one(id, policy, rng)?;
                    self.apply(id, computed, &mut report)?;
                }
            }
            UpdateDiscipline::Simultaneous => {
                // Phase 1: compute and stage. No commits happen here, so no
                // sampled agent observes another's new state.
                let mut staged = Vec::with_capacity(sampled.len());
                for &id in sampled {
                    staged.push((id, self.compute_one(id, policy, rng)?));
                }
                // Phase 2: commit every well-formed staged state.
                for (id, computed) in staged {
                    self.apply(id, computed, &mut report)?;
                }
            }
        }

        debug!(
            sampled = report.sampled,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            "batch complete"
        );
        Ok(report)
    }

    /// Compute one agent's staged state without committing anything.
    fn compute_one(
        &mut self,
        id: AgentId,
        policy: SelectionPolicy,
        rng: &mut SmallRng,
    ) -> Result<Computed, NetworkError> {
        let agent = self.agents.get(&id).ok_or(NetworkError::UnknownAgent(id))?;
        if !agent.has_predecessors() {
            debug!(agent = %id, "skipping update: no predecessors");
            return Ok(Computed::NoPredecessors);
        }

        let chosen = protocol::choose_influencers(agent.predecessors(), policy, rng)
            .map_err(NetworkError::Update)?;
        let mut influence_states = Vec::with_capacity(chosen.len());
        for pid in &chosen {
            let predecessor = self
                .agents
                .get(pid)
                .ok_or(NetworkError::UnknownAgent(*pid))?;
            influence_states.push(predecessor.state().to_vec());
        }
        let influencer = if chosen.len() == 1 {
            Some(chosen[0])
        } else {
            None
        };

        let agent = self.agents.get(&id).ok_or(NetworkError::UnknownAgent(id))?;
        let new_state = match agent.kind() {
            AgentKind::Binary => {
                let influences: Vec<f64> = influence_states.iter().map(|s| s[0]).collect();
                vec![binary::majority(agent.state()[0], &influences)]
            }
            AgentKind::Attitude { units_per_bank } => {
                let batch = BatchSpec {
                    agent_id: id,
                    agent_state: agent.state().to_vec(),
                    influencers: chosen.into_iter().zip(influence_states).collect(),
                    units_per_bank,
                };
                let adapter = self
                    .inference
                    .as_deref_mut()
                    .ok_or(NetworkError::Update(UpdateError::InferenceUnavailable))?;
                adapter
                    .infer(&batch, &self.inference_config)
                    .map_err(UpdateError::Inference)?
            }
        };

        if new_state == agent.state() {
            Ok(Computed::Unchanged { influencer })
        } else {
            Ok(Computed::New {
                state: new_state,
                influencer,
            })
        }
    }

    /// Commit phase for one agent: record the influencer diagnostic and, for
    /// a changed state, commit state and update count together.
    fn apply(
        &mut self,
        id: AgentId,
        computed: Computed,
        report: &mut StepReport,
    ) -> Result<(), NetworkError> {
        match computed {
            Computed::NoPredecessors => {
                report.skipped += 1;
            }
            Computed::Unchanged { influencer } => {
                let agent = self
                    .agents
                    .get_mut(&id)
                    .ok_or(NetworkError::UnknownAgent(id))?;
                if let Some(influencer) = influencer {
                    agent.set_last_influencer(influencer);
                }
                report.unchanged += 1;
            }
            Computed::New { state, influencer } => {
                let agent = self
                    .agents
                    .get_mut(&id)
                    .ok_or(NetworkError::UnknownAgent(id))?;
                if let Some(influencer) = influencer {
                    agent.set_last_influencer(influencer);
                }
                protocol::commit(agent, state)?;
                report.updated += 1;
            }
        }
        Ok(())
    }

    /// Emit one record per node for this time step, in id order, then clear
    /// the per-step transient fields on every node.
    pub fn export_step(
        &mut self,
        time_step: u64,
        logger: &mut StepLogger,
    ) -> Result<(), NetworkError> {
        for (&id, agent) in &self.agents {
            let record = StepRecord {
                time_step,
                agent_id: id.value(),
                update_count: agent.update_count(),
                state: agent.state().to_vec(),
                influenced_by: agent.last_influencer().map(AgentId::value),
            };
            logger.log(&record)?;
        }
        for agent in self.agents.values_mut() {
            agent.clear_last_influencer();
        }
        Ok(())
    }

    /// Render the topology as Graphviz DOT. Fire-and-forget export for
    /// visualization; the engine consumes nothing from it.
    pub fn write_dot(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let dot = Dot::with_config(&self.graph, &[DotConfig::EdgeNoLabel]);
        fs::write(path, format!("{:?}", dot))
    }
}
