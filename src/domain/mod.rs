//! Domain layer: the payment aggregate, its value objects, the confirmation
//! policy, the guarded transition engine and the ports its callers implement.

pub mod block;
pub mod confirmation;
pub mod events;
pub mod payment;
pub mod policy;
pub mod ports;
pub mod status;
pub mod transition;
pub mod values;
