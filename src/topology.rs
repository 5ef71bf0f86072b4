use crate::error::Error;
use crate::types::{Cost, INFINITY, RouterId};
use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;

/// Static network topology: each router's direct neighbors and link costs.
///
/// Directed costs are permitted (the cost A -> B need not equal B -> A), but
/// every identifier referenced as a neighbor must have a top-level entry of
/// its own. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    links: BTreeMap<RouterId, BTreeMap<RouterId, Cost>>,
}

impl Topology {
    /// Validates the raw adjacency map. All shape checks happen here, before
    /// any router is built, so the engine never meets a malformed link.
    pub fn new(links: BTreeMap<RouterId, BTreeMap<RouterId, Cost>>) -> Result<Self, Error> {
        for (router, neighbors) in &links {
            for (neighbor, &cost) in neighbors {
                if neighbor == router {
                    return Err(Error::SelfLink {
                        router: router.clone(),
                    });
                }
                if cost == 0 || cost >= INFINITY {
                    return Err(Error::InvalidLinkCost {
                        router: router.clone(),
                        neighbor: neighbor.clone(),
                        cost,
                    });
                }
                if !links.contains_key(neighbor) {
                    return Err(Error::DanglingNeighbor {
                        router: router.clone(),
                        neighbor: neighbor.clone(),
                    });
                }
            }
        }
        Ok(Self { links })
    }

    /// Loads a topology from a JSON file of the shape
    /// `{"A": {"B": 1, "C": 4}, "B": {"A": 1}, ...}`.
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let raw: BTreeMap<RouterId, BTreeMap<RouterId, Cost>> = serde_json::from_str(&content)?;
        Ok(Self::new(raw)?)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Router identifiers in ascending order.
    pub fn routers(&self) -> impl Iterator<Item = &RouterId> {
        self.links.keys()
    }

    pub fn neighbors(&self, router: &str) -> Option<&BTreeMap<RouterId, Cost>> {
        self.links.get(router)
    }

    pub(crate) fn into_links(self) -> BTreeMap<RouterId, BTreeMap<RouterId, Cost>> {
        self.links
    }
}
