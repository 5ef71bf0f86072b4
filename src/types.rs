use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type RouterId = String;

/// Link or path cost.
pub type Cost = u32;

/// Named sentinel for an unreachable destination. Cost arithmetic saturates
/// here, so a poisoned cost plus any finite link cost stays `INFINITY`.
pub const INFINITY: Cost = u32::MAX;

/// One row of a distance vector: the best known cost to a destination and
/// the direct neighbor that cost goes through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingEntry {
    pub cost: Cost,
    /// `None` exactly when the route has been invalidated (cost `INFINITY`).
    pub next_hop: Option<RouterId>,
}

/// Routing-table summary produced by one router for one specific neighbor
/// and consumed exactly once by that neighbor's relaxation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    entries: BTreeMap<RouterId, Cost>,
}

impl Advertisement {
    pub fn insert(&mut self, destination: RouterId, cost: Cost) {
        self.entries.insert(destination, cost);
    }

    pub fn get(&self, destination: &str) -> Option<Cost> {
        self.entries.get(destination).copied()
    }

    /// Advertised (destination, cost) pairs in ascending destination order.
    pub fn iter(&self) -> impl Iterator<Item = (&RouterId, Cost)> {
        self.entries.iter().map(|(dest, &cost)| (dest, cost))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(RouterId, Cost)> for Advertisement {
    fn from_iter<T: IntoIterator<Item = (RouterId, Cost)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Read-only rendering of one routing entry, `INFINITY` mapped to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub cost: Option<Cost>,
    pub next_hop: Option<RouterId>,
}

/// Read-only view of a full distance vector.
pub type TableSnapshot = BTreeMap<RouterId, RouteSnapshot>;
