//! Domain utility modules

pub mod ics;
