use crate::error::Error;
use crate::types::{
    Advertisement, Cost, INFINITY, RouteSnapshot, RouterId, RoutingEntry, TableSnapshot,
};
use std::collections::BTreeMap;
use tracing::debug;

/// One node of the simulated network.
///
/// Owns its distance vector exclusively: the only mutation path is
/// [`process_advertisement`](Router::process_advertisement), driven by the
/// engine's deliver phase. The router never initiates communication, it only
/// answers the engine's phase calls.
pub struct Router {
    id: RouterId,
    links: BTreeMap<RouterId, Cost>,
    poison_reverse: bool,
    vector: BTreeMap<RouterId, RoutingEntry>,
}

impl Router {
    /// Builds a router from its direct-link cost table. The initial vector
    /// holds the router itself at cost 0 and every direct neighbor at its
    /// link cost.
    pub fn new(
        id: RouterId,
        links: BTreeMap<RouterId, Cost>,
        poison_reverse: bool,
    ) -> Result<Self, Error> {
        let mut vector = BTreeMap::new();
        for (neighbor, &cost) in &links {
            if *neighbor == id {
                return Err(Error::SelfLink { router: id });
            }
            if cost == 0 || cost >= INFINITY {
                return Err(Error::InvalidLinkCost {
                    router: id,
                    neighbor: neighbor.clone(),
                    cost,
                });
            }
            vector.insert(
                neighbor.clone(),
                RoutingEntry {
                    cost,
                    next_hop: Some(neighbor.clone()),
                },
            );
        }
        vector.insert(
            id.clone(),
            RoutingEntry {
                cost: 0,
                next_hop: Some(id.clone()),
            },
        );
        Ok(Self {
            id,
            links,
            poison_reverse,
            vector,
        })
    }

    pub fn id(&self) -> &RouterId {
        &self.id
    }

    /// Direct neighbors in ascending identifier order.
    pub fn neighbors(&self) -> impl Iterator<Item = &RouterId> {
        self.links.keys()
    }

    pub fn link_cost(&self, neighbor: &str) -> Option<Cost> {
        self.links.get(neighbor).copied()
    }

    /// Routing-table summary to send to one specific neighbor.
    ///
    /// With split-horizon poison-reverse enabled, any destination currently
    /// reached *through* `target` is advertised at `INFINITY` so the neighbor
    /// can never route back through this router. The entry for the neighbor
    /// itself is exempt. Pure function of current state; the poisoning
    /// differs by recipient, so this runs once per neighbor per round.
    pub fn prepare_advertisement(&self, target: &RouterId) -> Advertisement {
        self.vector
            .iter()
            .map(|(dest, entry)| {
                let poisoned = self.poison_reverse
                    && entry.next_hop.as_deref() == Some(target.as_str())
                    && dest != target;
                let advertised = if poisoned { INFINITY } else { entry.cost };
                (dest.clone(), advertised)
            })
            .collect()
    }

    /// Folds a neighbor's advertisement into the distance vector
    /// (Bellman-Ford relaxation). Returns whether any entry changed.
    ///
    /// A strictly lower candidate cost is adopted with `from` as next hop.
    /// If the current best route already goes through `from` and the sender
    /// now advertises the destination at `INFINITY`, the route is
    /// invalidated. Entries for this router's own identifier are never
    /// overwritten.
    pub fn process_advertisement(
        &mut self,
        from: &RouterId,
        advertisement: &Advertisement,
    ) -> Result<bool, Error> {
        let Some(link_cost) = self.links.get(from).copied() else {
            return Err(Error::ProtocolViolation {
                receiver: self.id.clone(),
                sender: from.clone(),
            });
        };

        let mut changed = false;
        for (dest, advertised) in advertisement.iter() {
            if *dest == self.id {
                continue;
            }
            let candidate = advertised.saturating_add(link_cost);
            let (current_cost, current_next) = match self.vector.get(dest) {
                Some(entry) => (entry.cost, entry.next_hop.as_deref()),
                None => (INFINITY, None),
            };
            if candidate < current_cost {
                debug!(router = %self.id, %dest, cost = candidate, via = %from, "route adopted");
                self.vector.insert(
                    dest.clone(),
                    RoutingEntry {
                        cost: candidate,
                        next_hop: Some(from.clone()),
                    },
                );
                changed = true;
            } else if current_next == Some(from.as_str())
                && advertised == INFINITY
                && current_cost != INFINITY
            {
                // The neighbor our best route goes through has poisoned the
                // destination; the route is unusable.
                debug!(router = %self.id, %dest, via = %from, "route invalidated");
                self.vector.insert(
                    dest.clone(),
                    RoutingEntry {
                        cost: INFINITY,
                        next_hop: None,
                    },
                );
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Read-only view of the distance vector, `INFINITY` rendered as
    /// unreachable.
    pub fn snapshot(&self) -> TableSnapshot {
        self.vector
            .iter()
            .map(|(dest, entry)| {
                let snap = if entry.cost == INFINITY {
                    RouteSnapshot {
                        cost: None,
                        next_hop: None,
                    }
                } else {
                    RouteSnapshot {
                        cost: Some(entry.cost),
                        next_hop: entry.next_hop.clone(),
                    }
                };
                (dest.clone(), snap)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(pairs: &[(&str, Cost)]) -> BTreeMap<RouterId, Cost> {
        pairs.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    fn adv(pairs: &[(&str, Cost)]) -> Advertisement {
        pairs.iter().map(|(d, c)| (d.to_string(), *c)).collect()
    }

    fn router_a() -> Router {
        // A with direct links B:1, C:4.
        Router::new("A".into(), links(&[("B", 1), ("C", 4)]), true).unwrap()
    }

    #[test]
    fn test_initial_vector() {
        let router = router_a();
        let table = router.snapshot();
        assert_eq!(table["A"].cost, Some(0));
        assert_eq!(table["A"].next_hop.as_deref(), Some("A"));
        assert_eq!(table["B"].cost, Some(1));
        assert_eq!(table["B"].next_hop.as_deref(), Some("B"));
        assert_eq!(table["C"].cost, Some(4));
    }

    #[test]
    fn test_construction_rejects_bad_links() {
        assert!(matches!(
            Router::new("A".into(), links(&[("B", 0)]), false),
            Err(Error::InvalidLinkCost { .. })
        ));
        assert!(matches!(
            Router::new("A".into(), links(&[("B", INFINITY)]), false),
            Err(Error::InvalidLinkCost { .. })
        ));
        assert!(matches!(
            Router::new("A".into(), links(&[("A", 1)]), false),
            Err(Error::SelfLink { .. })
        ));
    }

    #[test]
    fn test_lower_cost_adopted() {
        let mut router = router_a();
        // B advertises D at 2: A should learn D at 1 + 2 = 3 via B.
        let changed = router
            .process_advertisement(&"B".to_string(), &adv(&[("B", 0), ("D", 2)]))
            .unwrap();
        assert!(changed);
        let table = router.snapshot();
        assert_eq!(table["D"].cost, Some(3));
        assert_eq!(table["D"].next_hop.as_deref(), Some("B"));
    }

    #[test]
    fn test_equal_cost_keeps_current_route() {
        let mut router = router_a();
        // B advertises C at 3: candidate 1 + 3 = 4 ties the direct link, so
        // the existing route via C survives.
        let changed = router
            .process_advertisement(&"B".to_string(), &adv(&[("C", 3)]))
            .unwrap();
        assert!(!changed);
        assert_eq!(router.snapshot()["C"].next_hop.as_deref(), Some("C"));
    }

    #[test]
    fn test_self_route_never_overwritten() {
        let mut router = router_a();
        let changed = router
            .process_advertisement(&"B".to_string(), &adv(&[("A", 0)]))
            .unwrap();
        assert!(!changed);
        let table = router.snapshot();
        assert_eq!(table["A"].cost, Some(0));
        assert_eq!(table["A"].next_hop.as_deref(), Some("A"));
    }

    #[test]
    fn test_poison_reverse_advertisement() {
        let mut router = router_a();
        router
            .process_advertisement(&"B".to_string(), &adv(&[("D", 2)]))
            .unwrap();
        // A routes D via B, so the summary for B poisons D but not B itself.
        let update = router.prepare_advertisement(&"B".to_string());
        assert_eq!(update.get("D"), Some(INFINITY));
        assert_eq!(update.get("B"), Some(1));
        assert_eq!(update.get("C"), Some(4));
        // The summary for C advertises D honestly.
        let update = router.prepare_advertisement(&"C".to_string());
        assert_eq!(update.get("D"), Some(3));
    }

    #[test]
    fn test_no_poison_when_disabled() {
        let mut router = Router::new("A".into(), links(&[("B", 1), ("C", 4)]), false).unwrap();
        router
            .process_advertisement(&"B".to_string(), &adv(&[("D", 2)]))
            .unwrap();
        let update = router.prepare_advertisement(&"B".to_string());
        assert_eq!(update.get("D"), Some(3));
    }

    #[test]
    fn test_poison_invalidates_route() {
        let mut router = router_a();
        router
            .process_advertisement(&"B".to_string(), &adv(&[("D", 2)]))
            .unwrap();
        let changed = router
            .process_advertisement(&"B".to_string(), &adv(&[("D", INFINITY)]))
            .unwrap();
        assert!(changed);
        let table = router.snapshot();
        assert_eq!(table["D"].cost, None);
        assert_eq!(table["D"].next_hop, None);
    }

    #[test]
    fn test_poison_from_other_neighbor_ignored() {
        let mut router = router_a();
        router
            .process_advertisement(&"B".to_string(), &adv(&[("D", 2)]))
            .unwrap();
        // C poisons D, but A routes D via B: the entry must survive.
        let changed = router
            .process_advertisement(&"C".to_string(), &adv(&[("D", INFINITY)]))
            .unwrap();
        assert!(!changed);
        assert_eq!(router.snapshot()["D"].cost, Some(3));
    }

    #[test]
    fn test_saturating_cost_arithmetic() {
        let mut router = router_a();
        // INFINITY plus a finite link cost must stay INFINITY, never wrap,
        // and an all-INFINITY candidate is never adopted.
        let changed = router
            .process_advertisement(&"B".to_string(), &adv(&[("Z", INFINITY)]))
            .unwrap();
        assert!(!changed);
        assert!(!router.snapshot().contains_key("Z"));
    }

    #[test]
    fn test_unknown_sender_is_protocol_violation() {
        let mut router = router_a();
        let err = router
            .process_advertisement(&"Z".to_string(), &adv(&[("B", 1)]))
            .unwrap_err();
        assert_eq!(
            err,
            Error::ProtocolViolation {
                receiver: "A".into(),
                sender: "Z".into(),
            }
        );
    }
}
