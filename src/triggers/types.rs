use crate::types::Dbm;

/// Number of hardware comparator slots exposed by the firmware.
pub const TRIGGER_SLOT_COUNT: usize = 8;

pub type ClientId = u16;

/// Marks a slot without an external owner.
pub const NO_CLIENT: ClientId = 0;

/// Classified cause for considering a roam. Declaration order is priority
/// order; comparisons use the derived `Ord`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoamingTrigger {
    #[default]
    None,
    LowQualityForBgScan,
    NormalQualityForBgScan,
    LowTxRate,
    LowSnr,
    LowQuality,
    MaxTxRetries,
    BssLoss,
    SwitchChannel,
    ApDisconnect,
    SecurityAttack,
}

impl RoamingTrigger {
    pub const ALL: [Self; 11] = [
        Self::None,
        Self::LowQualityForBgScan,
        Self::NormalQualityForBgScan,
        Self::LowTxRate,
        Self::LowSnr,
        Self::LowQuality,
        Self::MaxTxRetries,
        Self::BssLoss,
        Self::SwitchChannel,
        Self::ApDisconnect,
        Self::SecurityAttack,
    ];

    /// Upper bound (inclusive) of the background-scan pacing group.
    pub const BG_SCAN_GROUP: Self = Self::NormalQualityForBgScan;
    /// Upper bound (inclusive) of the debounced low-quality group.
    pub const LOW_QUALITY_GROUP: Self = Self::LowQuality;
    /// Triggers at or above this mean the current BSS is gone.
    pub const NO_BSS_THRESHOLD: Self = Self::BssLoss;
    /// Triggers strictly above this pre-empt a masked attempt.
    pub const FAST_CONNECT_GROUP: Self = Self::SwitchChannel;

    pub fn is_bg_scan(self) -> bool {
        self != Self::None && self <= Self::BG_SCAN_GROUP
    }

    pub fn is_low_quality(self) -> bool {
        self > Self::BG_SCAN_GROUP && self <= Self::LOW_QUALITY_GROUP
    }

    pub fn is_loss(self) -> bool {
        self >= Self::NO_BSS_THRESHOLD
    }

    pub fn is_full_connect(self) -> bool {
        self > Self::FAST_CONNECT_GROUP
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::LowQualityForBgScan => "LowQualityForBgScan",
            Self::NormalQualityForBgScan => "NormalQualityForBgScan",
            Self::LowTxRate => "LowTxRate",
            Self::LowSnr => "LowSnr",
            Self::LowQuality => "LowQuality",
            Self::MaxTxRetries => "MaxTxRetries",
            Self::BssLoss => "BssLoss",
            Self::SwitchChannel => "SwitchChannel",
            Self::ApDisconnect => "ApDisconnect",
            Self::SecurityAttack => "SecurityAttack",
        }
    }
}

/// Raw firmware report attached to a link-quality event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerPayload {
    pub level: i16,
    pub reason: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkMetric {
    Rssi,
    Snr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdDirection {
    Falling,
    Rising,
}

/// Comparator setup pushed to the firmware when a slot is armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerParams {
    pub metric: LinkMetric,
    pub threshold: Dbm,
    pub direction: ThresholdDirection,
    pub hysteresis_db: u8,
    pub pacing_ms: u16,
}

impl TriggerParams {
    pub const fn falling(metric: LinkMetric, threshold: Dbm) -> Self {
        Self {
            metric,
            threshold,
            direction: ThresholdDirection::Falling,
            hysteresis_db: 3,
            pacing_ms: 1_000,
        }
    }

    pub const fn rising(metric: LinkMetric, threshold: Dbm) -> Self {
        Self {
            direction: ThresholdDirection::Rising,
            ..Self::falling(metric, threshold)
        }
    }
}
