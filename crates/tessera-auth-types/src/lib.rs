//! Caller identity supplied by the gateway in front of Tessera services.

pub mod identity;
