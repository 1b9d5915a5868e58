//! Feed subscription synchronization: ports and the reconciliation engine.

pub mod ports;
pub mod service;
