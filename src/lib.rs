//! Station-side roaming and connection-management core of an 802.11 driver.
//!
//! Everything here runs in one cooperative execution context: firmware events,
//! scan completions and timer expiries are queued on the [`station::Station`]
//! and dispatched strictly in arrival order.

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod actions;
pub mod config;
pub mod conn;
pub mod error;
pub mod gen_sm;
pub mod roaming;
pub mod services;
pub mod station;
pub mod triggers;
pub mod types;

pub use config::{active_config, OperationalMode, RoamingConfig};
pub use error::RoamError;
pub use station::{DriverEvent, Station};
pub use types::{BssEntry, BssType, Dbm, MacAddr, RoamTarget, SiteRecord};
