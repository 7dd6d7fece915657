//! Multi-tier, distributed rate limiting
//!
//! Fixed-window counters keyed by principal, scope and window start, kept in
//! a shared [`CounterStore`](crate::storage::CounterStore) so that every
//! service enforces one quota per principal.

pub mod clock;
pub mod coordinator;
pub mod degradation;
pub mod enforcer;
pub mod policy;
pub mod types;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::DistributedCoordinator;
pub use degradation::{DegradationController, DegradationState, DegradationTransition};
pub use enforcer::{RateLimitEnforcer, Usage};
pub use policy::TierPolicyResolver;
pub use types::{CounterKey, Decision, FailureMode, Policy, Principal, Scope, Tier};
