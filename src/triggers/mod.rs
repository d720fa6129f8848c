mod registry;
mod types;


pub use registry::{InternalHandler, SlotOwner, SlotSnapshot, TriggerBinding, TriggerRegistry};
pub use types::{
    ClientId, LinkMetric, RoamingTrigger, ThresholdDirection, TriggerParams, TriggerPayload,
    NO_CLIENT, TRIGGER_SLOT_COUNT,
};
