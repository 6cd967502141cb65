//! Transaction orchestration for protocol actions.
//!
//! Every state-changing action is sequenced the same way: an optional ERC-20
//! approval, a wait for its inclusion, the primary engine call, and a wait
//! for that. Requests carry an explicit phase value so each step of the
//! sequence is observable and every transition is checked.

pub mod engine;
pub mod request;

pub use engine::*;
pub use request::*;
