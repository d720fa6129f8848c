use super::types::{
    ConnAction::{self, *},
    ConnActions, ConnCtx, ConnOutput, InfraEvent, InfraState, JoinKind, PortStatus, SmeReport,
};
use crate::gen_sm::{nop, Action, StateMachine, Transition, TransitionTable};

type Next = Option<InfraEvent>;
type InfraTransition<'a> = Transition<InfraState, InfraEvent, ConnCtx<'a>>;

/// Link state towards an access point. `Handover` re-joins the roam target from
/// any state that holds or is building a link.
pub struct InfraConnection {
    sm: StateMachine<InfraState, InfraEvent>,
}

impl InfraConnection {
    pub const fn new() -> Self {
        Self {
            sm: StateMachine::new("conn-infra", InfraState::Idle),
        }
    }

    pub fn state(&self) -> InfraState {
        self.sm.current()
    }

    pub fn machine(&self) -> &StateMachine<InfraState, InfraEvent> {
        &self.sm
    }

    pub fn fire(&mut self, event: InfraEvent) -> ConnOutput<InfraState> {
        let mut actions = ConnActions::new();
        let mut ctx = ConnCtx {
            actions: &mut actions,
            connect_timeout_ms: 0,
        };
        let state = self.sm.fire(&InfraTable, event, &mut ctx);
        ConnOutput { actions, state }
    }

    pub fn reset(&mut self) {
        self.sm.reset(InfraState::Idle);
    }
}

impl Default for InfraConnection {
    fn default() -> Self {
        Self::new()
    }
}

struct InfraTable;

impl<'a> TransitionTable<InfraState, InfraEvent, ConnCtx<'a>> for InfraTable {
    fn lookup(&self, state: InfraState, event: InfraEvent) -> Option<InfraTransition<'a>> {
        use InfraEvent as E;
        use InfraState as S;

        let (next, action): (InfraState, Action<ConnCtx<'a>, InfraEvent>) = match (state, event) {
            (S::Idle, E::Connect) => (S::WaitJoinComplete, join),
            (S::Idle, E::Disconnect) => (S::Idle, nop),

            (S::WaitJoinComplete, E::JoinComplete) => (S::MlmeWait, start_mlme),
            (S::WaitJoinComplete, E::Handover) => (S::WaitJoinComplete, rejoin),
            (S::WaitJoinComplete, E::Disconnect) => (S::WaitDisconnectComplete, close_link),

            (S::MlmeWait, E::MlmeSuccess) => (S::RsnWait, associated),
            (S::MlmeWait, E::Handover) => (S::WaitJoinComplete, rejoin),
            (S::MlmeWait, E::Disconnect) => (S::WaitDisconnectComplete, close_link),

            (S::RsnWait, E::RsnSuccess) => (S::Connected, rsn_success),
            (S::RsnWait, E::Handover) => (S::WaitJoinComplete, rsn_wait_handover),
            (S::RsnWait, E::Disconnect) => (S::WaitDisconnectComplete, rsn_wait_disconnect),

            (S::Connected, E::Handover) => (S::WaitJoinComplete, connected_handover),
            (S::Connected, E::Disconnect) => (S::WaitDisconnectComplete, connected_disconnect),

            (S::WaitDisconnectComplete, E::DisconnectComplete) => (S::Idle, disconnect_complete),

            _ => return None,
        };
        Some(Transition::new(next, action))
    }
}

fn run(ctx: &mut ConnCtx<'_>, actions: &[ConnAction]) -> Next {
    ctx.push_all(actions);
    None
}

fn join(ctx: &mut ConnCtx<'_>) -> Next {
    run(ctx, &[Join(JoinKind::Infrastructure)])
}

fn start_mlme(ctx: &mut ConnCtx<'_>) -> Next {
    run(ctx, &[StartMlme])
}

fn rejoin(ctx: &mut ConnCtx<'_>) -> Next {
    run(ctx, &[Join(JoinKind::Handover)])
}

fn close_link(ctx: &mut ConnCtx<'_>) -> Next {
    run(ctx, &[SetPort(PortStatus::Closed), DisconnectFirmware])
}

fn associated(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[NotifyAssociated, SetPort(PortStatus::EapolOnly), StartRsn],
    )
}

fn rsn_success(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[
            StartTrafficMonitor,
            SetHealth { connected: true },
            SetPort(PortStatus::Open),
            ReportToSme(SmeReport::Connected),
        ],
    )
}

fn rsn_wait_handover(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[StopRsn, SetPort(PortStatus::Closed), Join(JoinKind::Handover)],
    )
}

fn rsn_wait_disconnect(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[StopRsn, SetPort(PortStatus::Closed), DisconnectFirmware],
    )
}

fn connected_handover(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[
            StopTrafficMonitor,
            SetHealth { connected: false },
            StopRsn,
            SetPort(PortStatus::Closed),
            Join(JoinKind::Handover),
        ],
    )
}

fn connected_disconnect(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[
            StopTrafficMonitor,
            SetHealth { connected: false },
            StopRsn,
            SetPort(PortStatus::Closed),
            DisconnectFirmware,
        ],
    )
}

fn disconnect_complete(ctx: &mut ConnCtx<'_>) -> Next {
    run(ctx, &[ReportToSme(SmeReport::Disconnected)])
}
