//! One-shot calendar import and export.

pub mod service;
