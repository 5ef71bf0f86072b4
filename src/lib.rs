//! Distance-vector routing protocol simulator.
//!
//! Routers converge on shortest-cost paths by exchanging routing-table
//! summaries with their direct neighbors (distributed Bellman-Ford with
//! optional split-horizon poison-reverse), driven in synchronous rounds by
//! a [`SimulationEngine`] until no vector changes or the round budget runs
//! out.

pub mod error;
pub mod router;
pub mod simulation;
pub mod topology;
pub mod types;

pub use error::Error;
pub use router::Router;
pub use simulation::{Outcome, RoundObserver, SimulationConfig, SimulationEngine};
pub use topology::Topology;
pub use types::{
    Advertisement, Cost, INFINITY, RouteSnapshot, RouterId, RoutingEntry, TableSnapshot,
};
