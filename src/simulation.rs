use crate::error::Error;
use crate::router::Router;
use crate::topology::Topology;
use crate::types::{Advertisement, RouterId, TableSnapshot};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Knobs for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Round budget; the sole liveness guard against non-convergent
    /// topologies.
    pub max_rounds: u32,
    /// Enable split-horizon with poison-reverse on every router.
    pub poison_reverse: bool,
    /// Run the advertise and deliver phases on the rayon pool instead of a
    /// single thread. The outcome is identical either way.
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 100,
            poison_reverse: false,
            parallel: false,
        }
    }
}

/// Result of a run.
///
/// Non-convergence is an expected outcome, not an error: some topologies
/// without poison-reverse genuinely never settle within a bounded round
/// count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub converged: bool,
    pub rounds_executed: u32,
    /// Final distance-vector snapshot of every router.
    pub tables: BTreeMap<RouterId, TableSnapshot>,
}

/// Per-round reporting hook.
///
/// Called after every round's deliver phase with a consistent snapshot of
/// all routing tables. Returning `false` cancels the run at the round
/// boundary; a cancelled run reports `converged = false` with the rounds
/// executed so far.
pub trait RoundObserver {
    fn on_round(&mut self, round: u32, tables: &BTreeMap<RouterId, TableSnapshot>) -> bool;
}

impl RoundObserver for () {
    fn on_round(&mut self, _round: u32, _tables: &BTreeMap<RouterId, TableSnapshot>) -> bool {
        true
    }
}

/// Advertisements staged during one round's advertise phase, grouped by
/// receiver, each inbox in ascending sender order.
type Staged = BTreeMap<RouterId, Vec<(RouterId, Advertisement)>>;

/// Drives synchronous advertise/deliver rounds over a fixed set of routers
/// until convergence or round-budget exhaustion.
///
/// The engine owns every [`Router`] outright; routers are touched only
/// through the phase calls below, so no shared mutable state exists anywhere
/// in a round.
pub struct SimulationEngine {
    routers: BTreeMap<RouterId, Router>,
    config: SimulationConfig,
}

impl SimulationEngine {
    /// Builds one router per topology entry, each wired with its own
    /// neighbor-cost table.
    pub fn new(topology: Topology, config: SimulationConfig) -> Result<Self, Error> {
        let mut routers = BTreeMap::new();
        for (id, links) in topology.into_links() {
            let router = Router::new(id.clone(), links, config.poison_reverse)?;
            routers.insert(id, router);
        }
        Ok(Self { routers, config })
    }

    /// Current distance-vector snapshot of every router.
    pub fn snapshots(&self) -> BTreeMap<RouterId, TableSnapshot> {
        self.routers
            .iter()
            .map(|(id, router)| (id.clone(), router.snapshot()))
            .collect()
    }

    pub fn run(&mut self) -> Result<Outcome, Error> {
        self.run_with_observer(&mut ())
    }

    /// Runs the round loop, invoking `observer` after every round.
    ///
    /// Every advertisement of a round is staged from the pre-round state of
    /// all routers before any delivery happens, so no router sees a
    /// same-round update while advertisements are being computed. Delivery
    /// to a given receiver applies senders in ascending identifier order,
    /// which pins down the order-sensitive poison-invalidate branch across
    /// runs and across execution modes.
    pub fn run_with_observer(&mut self, observer: &mut dyn RoundObserver) -> Result<Outcome, Error> {
        let mut converged = false;
        let mut rounds_executed = 0;
        for round in 1..=self.config.max_rounds {
            let staged = if self.config.parallel {
                self.advertise_parallel()
            } else {
                self.advertise()
            };
            let changed = if self.config.parallel {
                self.deliver_parallel(&staged)?
            } else {
                self.deliver(&staged)?
            };
            rounds_executed = round;
            let keep_going = observer.on_round(round, &self.snapshots());
            if !changed {
                converged = true;
                info!(rounds = round, "converged");
                break;
            }
            if !keep_going {
                info!(round, "run cancelled at round boundary");
                break;
            }
        }
        if !converged {
            info!(
                rounds = rounds_executed,
                budget = self.config.max_rounds,
                "stopped without convergence"
            );
        }
        Ok(Outcome {
            converged,
            rounds_executed,
            tables: self.snapshots(),
        })
    }

    /// Advertise phase: one summary per (sender, neighbor) pair, all computed
    /// from the routers' pre-round state.
    fn advertise(&self) -> Staged {
        let mut staged = Staged::new();
        for (id, router) in &self.routers {
            for neighbor in router.neighbors() {
                let update = router.prepare_advertisement(neighbor);
                staged
                    .entry(neighbor.clone())
                    .or_default()
                    .push((id.clone(), update));
            }
        }
        staged
    }

    /// Parallel advertise phase: an embarrassingly parallel map over routers,
    /// re-sorted into the same canonical (receiver, sender) order the
    /// sequential phase produces. The collect is the round barrier.
    fn advertise_parallel(&self) -> Staged {
        let mut flat: Vec<(RouterId, RouterId, Advertisement)> = self
            .routers
            .par_iter()
            .flat_map_iter(|(id, router)| {
                router.neighbors().map(move |neighbor| {
                    (
                        neighbor.clone(),
                        id.clone(),
                        router.prepare_advertisement(neighbor),
                    )
                })
            })
            .collect();
        flat.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));

        let mut staged = Staged::new();
        for (receiver, sender, update) in flat {
            staged.entry(receiver).or_default().push((sender, update));
        }
        staged
    }

    /// Deliver phase: each receiver folds its inbox in sender order. Returns
    /// whether any router's vector changed.
    fn deliver(&mut self, staged: &Staged) -> Result<bool, Error> {
        let mut any_change = false;
        for (id, router) in self.routers.iter_mut() {
            let Some(inbox) = staged.get(id) else {
                continue;
            };
            for (sender, update) in inbox {
                if router.process_advertisement(sender, update)? {
                    any_change = true;
                }
            }
        }
        Ok(any_change)
    }

    /// Parallel deliver phase: each router mutates only its own vector and
    /// reads only the staged advertisements addressed to it.
    fn deliver_parallel(&mut self, staged: &Staged) -> Result<bool, Error> {
        self.routers
            .par_iter_mut()
            .map(|(id, router)| {
                let Some(inbox) = staged.get(id) else {
                    return Ok(false);
                };
                let mut changed = false;
                for (sender, update) in inbox {
                    if router.process_advertisement(sender, update)? {
                        changed = true;
                    }
                }
                Ok(changed)
            })
            .try_reduce(|| false, |a, b| Ok(a || b))
    }
}
