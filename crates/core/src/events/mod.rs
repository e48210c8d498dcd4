//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events after
//! successful, persisted ledger mutations. The ledger itself never notifies
//! anyone; services emit through the sink the host application subscribes to.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
