use crate::{actions::ActionBuffer, gen_sm::SmLabel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    /// Start a new IBSS with ourselves as the only member.
    SelfStart,
    /// Join an existing IBSS.
    Join,
    /// Re-synchronize with a peer that shares our IBSS.
    Merge,
    Infrastructure,
    Handover,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortStatus {
    Closed,
    EapolOnly,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmeReport {
    Connected,
    Disconnected,
}

/// Ordered side effects of one connection-machine dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnAction {
    Join(JoinKind),
    StartMlme,
    StartConnectTimer { ms: u32 },
    StopConnectTimer,
    NotifyAssociated,
    RemoveSelfSite,
    SetPort(PortStatus),
    DisconnectFirmware,
    StartRsn,
    StopRsn,
    StartTrafficMonitor,
    StopTrafficMonitor,
    SetHealth { connected: bool },
    ReportToSme(SmeReport),
}

pub type ConnActions = ActionBuffer<ConnAction, 8>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnOutput<S> {
    pub actions: ConnActions,
    pub state: S,
}

pub struct ConnCtx<'a> {
    pub actions: &'a mut ConnActions,
    pub connect_timeout_ms: u32,
}

impl ConnCtx<'_> {
    pub(super) fn push_all(&mut self, actions: &[ConnAction]) {
        for action in actions {
            self.actions.push(*action);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IbssState {
    Idle,
    SelfWait,
    RsnWait,
    Connected,
    WaitDisconnectComplete,
}

impl IbssState {
    pub const ALL: [Self; 5] = [
        Self::Idle,
        Self::SelfWait,
        Self::RsnWait,
        Self::Connected,
        Self::WaitDisconnectComplete,
    ];
}

impl SmLabel for IbssState {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::SelfWait => "SelfWait",
            Self::RsnWait => "RsnWait",
            Self::Connected => "Connected",
            Self::WaitDisconnectComplete => "WaitDisconnectComplete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IbssEvent {
    Create,
    Connect,
    Disconnect,
    RsnSuccess,
    PeerJoined,
    Merge,
    DisconnectComplete,
}

impl IbssEvent {
    pub const ALL: [Self; 7] = [
        Self::Create,
        Self::Connect,
        Self::Disconnect,
        Self::RsnSuccess,
        Self::PeerJoined,
        Self::Merge,
        Self::DisconnectComplete,
    ];

    /// Firmware and peer notifications. The rest are commands issued by the
    /// station itself.
    pub fn is_completion(self) -> bool {
        matches!(
            self,
            Self::RsnSuccess | Self::PeerJoined | Self::Merge | Self::DisconnectComplete
        )
    }
}

impl SmLabel for IbssEvent {
    fn name(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Connect => "Connect",
            Self::Disconnect => "Disconnect",
            Self::RsnSuccess => "RsnSuccess",
            Self::PeerJoined => "PeerJoined",
            Self::Merge => "Merge",
            Self::DisconnectComplete => "DisconnectComplete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfraState {
    Idle,
    WaitJoinComplete,
    MlmeWait,
    RsnWait,
    Connected,
    WaitDisconnectComplete,
}

impl InfraState {
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::WaitJoinComplete,
        Self::MlmeWait,
        Self::RsnWait,
        Self::Connected,
        Self::WaitDisconnectComplete,
    ];
}

impl SmLabel for InfraState {
    fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::WaitJoinComplete => "WaitJoinComplete",
            Self::MlmeWait => "MlmeWait",
            Self::RsnWait => "RsnWait",
            Self::Connected => "Connected",
            Self::WaitDisconnectComplete => "WaitDisconnectComplete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfraEvent {
    Connect,
    JoinComplete,
    MlmeSuccess,
    RsnSuccess,
    Handover,
    Disconnect,
    DisconnectComplete,
}

impl InfraEvent {
    pub const ALL: [Self; 7] = [
        Self::Connect,
        Self::JoinComplete,
        Self::MlmeSuccess,
        Self::RsnSuccess,
        Self::Handover,
        Self::Disconnect,
        Self::DisconnectComplete,
    ];

    pub fn is_completion(self) -> bool {
        matches!(
            self,
            Self::JoinComplete | Self::MlmeSuccess | Self::RsnSuccess | Self::DisconnectComplete
        )
    }
}

impl SmLabel for InfraEvent {
    fn name(self) -> &'static str {
        match self {
            Self::Connect => "Connect",
            Self::JoinComplete => "JoinComplete",
            Self::MlmeSuccess => "MlmeSuccess",
            Self::RsnSuccess => "RsnSuccess",
            Self::Handover => "Handover",
            Self::Disconnect => "Disconnect",
            Self::DisconnectComplete => "DisconnectComplete",
        }
    }
}
