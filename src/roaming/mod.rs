//! Roaming decision engine: trigger intake, debounce, the scan retry ladder and
//! candidate selection, over one of two transition tables.

mod candidates;
mod engine;
mod machine;
mod tables;
mod types;


pub use candidates::{Candidate, CandidateLists, MAX_CANDIDATES};
pub use engine::RoamingEngine;
pub use machine::{RoamingCtx, RoamingData};
pub use tables::RoamingMode;
pub use types::{
    ConnectionStatus, RoamingAction, RoamingActions, RoamingEvent, RoamingOutput, RoamingState,
    ScanStatus, ScanType,
};
