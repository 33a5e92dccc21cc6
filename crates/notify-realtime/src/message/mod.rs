//! Channel message types, validation, decoding and routing.

pub mod router;
pub mod serializer;
pub mod types;
pub mod validator;

pub use router::{MessageRouter, Routed};
pub use types::{InboundEvent, InboundFrame, OutboundMessage};
