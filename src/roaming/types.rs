use crate::{actions::ActionBuffer, gen_sm::SmLabel, triggers::RoamingTrigger, types::MacAddr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoamingState {
    Idle,
    WaitForTrigger,
    WaitForCommand,
    Scanning,
    Selecting,
    Connecting,
}

impl RoamingState {
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::WaitForTrigger,
        Self::WaitForCommand,
        Self::Scanning,
        Self::Selecting,
        Self::Connecting,
    ];

    /// States that only exist while an attempt owns the mask.
    pub fn is_attempt(self) -> bool {
        matches!(self, Self::Scanning | Self::Selecting | Self::Connecting)
    }
}

impl SmLabel for RoamingState {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::WaitForTrigger => "WaitForTrigger",
            Self::WaitForCommand => "WaitForCommand",
            Self::Scanning => "Scanning",
            Self::Selecting => "Selecting",
            Self::Connecting => "Connecting",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoamingEvent {
    Start,
    Stop,
    RoamTrigger,
    Scan,
    Select,
    RequestHandover,
    RoamSuccess,
    Failure,
}

impl RoamingEvent {
    pub const ALL: [Self; 8] = [
        Self::Start,
        Self::Stop,
        Self::RoamTrigger,
        Self::Scan,
        Self::Select,
        Self::RequestHandover,
        Self::RoamSuccess,
        Self::Failure,
    ];
}

impl SmLabel for RoamingEvent {
    fn name(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::RoamTrigger => "RoamTrigger",
            Self::Scan => "Scan",
            Self::Select => "Select",
            Self::RequestHandover => "RequestHandover",
            Self::RoamSuccess => "RoamSuccess",
            Self::Failure => "Failure",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanType {
    #[default]
    None,
    Partial,
    PartialRetry,
    Full,
    FullRetry,
}

impl ScanType {
    /// Next rung of the failed-scan ladder, or `None` once it is exhausted.
    pub fn next_retry(self) -> Option<Self> {
        match self {
            Self::Partial => Some(Self::PartialRetry),
            Self::PartialRetry => Some(Self::Full),
            Self::Full => Some(Self::FullRetry),
            Self::FullRetry | Self::None => None,
        }
    }

    pub fn is_partial(self) -> bool {
        matches!(self, Self::Partial | Self::PartialRetry)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Partial => "Partial",
            Self::PartialRetry => "PartialRetry",
            Self::Full => "Full",
            Self::FullRetry => "FullRetry",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanStatus {
    Ok,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    NotConnected,
    HandoverSuccess,
    HandoverFailure,
}

/// Commands the engine hands to its collaborators after a dispatch step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoamingAction {
    RequestScan(ScanType),
    AbortScan,
    QualityHint { low: bool },
    /// Hand the current roam target to the connection machine.
    ConnectToTarget,
    ReportTrigger(RoamingTrigger),
    ReportScanResults { candidates: usize },
    ReportRoamSuccess { bssid: MacAddr },
    ReportRoamFailure { trigger: RoamingTrigger, disconnect: bool },
}

pub type RoamingActions = ActionBuffer<RoamingAction, 8>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoamingOutput {
    pub actions: RoamingActions,
    pub state: RoamingState,
}
