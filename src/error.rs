use core::fmt;

use crate::types::MacAddr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoamError {
    RegistryFull,
    InvalidSlot(u8),
    UnboundSlot(u8),
    SlotTaken(u8),
    InvalidClient,
    UnknownBss(MacAddr),
    WrongMode,
    NotConnected,
    Busy,
    QueueFull,
    FrameTooLarge { len: usize },
    Firmware,
}

impl fmt::Display for RoamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryFull => f.write_str("no free trigger slot"),
            Self::InvalidSlot(slot) => write!(f, "trigger slot {} out of range", slot),
            Self::UnboundSlot(slot) => write!(f, "trigger slot {} is not bound", slot),
            Self::SlotTaken(slot) => write!(f, "trigger slot {} is owned by a client", slot),
            Self::InvalidClient => f.write_str("client id 0 is reserved"),
            Self::UnknownBss(bssid) => write!(f, "bss {} not found", bssid),
            Self::WrongMode => f.write_str("operation not valid in this roaming mode"),
            Self::NotConnected => f.write_str("station is not connected"),
            Self::Busy => f.write_str("connection machine is not idle"),
            Self::QueueFull => f.write_str("driver event queue full"),
            Self::FrameTooLarge { len } => write!(f, "frame of {} bytes exceeds copy limit", len),
            Self::Firmware => f.write_str("firmware rejected the command"),
        }
    }
}

impl core::error::Error for RoamError {}
