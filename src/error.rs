use crate::types::{Cost, RouterId};
use thiserror::Error;

/// Errors raised by topology validation and the simulation engine.
///
/// All of them are detected eagerly, at construction or at the point of
/// misuse. Non-convergence is not an error: it is reported through
/// [`Outcome`](crate::simulation::Outcome).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Link costs must be positive and below [`INFINITY`](crate::types::INFINITY).
    #[error("invalid link cost {cost} on {router} -> {neighbor}")]
    InvalidLinkCost {
        router: RouterId,
        neighbor: RouterId,
        cost: Cost,
    },
    #[error("{router} lists itself as a neighbor")]
    SelfLink { router: RouterId },
    #[error("{router} references neighbor {neighbor} with no topology entry")]
    DanglingNeighbor {
        router: RouterId,
        neighbor: RouterId,
    },
    /// Advertisements may only arrive along configured direct links; this is
    /// a caller bug and is fatal to the run.
    #[error("{receiver} received an advertisement from {sender}, which is not a direct neighbor")]
    ProtocolViolation {
        receiver: RouterId,
        sender: RouterId,
    },
}
