//! Connection state machines: the ordered side effects that open and close the
//! data path and security pipeline for IBSS and infrastructure links.

mod ibss;
mod infra;
mod types;


pub use ibss::IbssConnection;
pub use infra::InfraConnection;
pub use types::{
    ConnAction, ConnActions, ConnCtx, ConnOutput, IbssEvent, IbssState, InfraEvent, InfraState,
    JoinKind, PortStatus, SmeReport,
};
