use super::types::{
    ConnAction::{self, *},
    ConnActions, ConnCtx, ConnOutput, IbssEvent, IbssState, JoinKind, PortStatus, SmeReport,
};
use crate::gen_sm::{nop, Action, StateMachine, Transition, TransitionTable};

type Next = Option<IbssEvent>;
type IbssTransition<'a> = Transition<IbssState, IbssEvent, ConnCtx<'a>>;

/// Ad-hoc link state. `Disconnect` always drains through
/// `WaitDisconnectComplete` before the machine accepts a new `Create`/`Connect`.
pub struct IbssConnection {
    sm: StateMachine<IbssState, IbssEvent>,
    connect_timeout_ms: u32,
}

impl IbssConnection {
    pub const fn new(connect_timeout_ms: u32) -> Self {
        Self {
            sm: StateMachine::new("conn-ibss", IbssState::Idle),
            connect_timeout_ms,
        }
    }

    pub fn state(&self) -> IbssState {
        self.sm.current()
    }

    pub fn machine(&self) -> &StateMachine<IbssState, IbssEvent> {
        &self.sm
    }

    pub fn fire(&mut self, event: IbssEvent) -> ConnOutput<IbssState> {
        let mut actions = ConnActions::new();
        let mut ctx = ConnCtx {
            actions: &mut actions,
            connect_timeout_ms: self.connect_timeout_ms,
        };
        let state = self.sm.fire(&IbssTable, event, &mut ctx);
        ConnOutput { actions, state }
    }

    /// Self-wait timer expiry: nobody joined our IBSS in time. Handled as a
    /// disconnect in `SelfWait` and ignored anywhere else.
    pub fn on_connect_timeout(&mut self) -> Option<ConnOutput<IbssState>> {
        if self.sm.current() != IbssState::SelfWait {
            debug!("conn-ibss: stale connect timeout ignored");
            return None;
        }
        warn!(
            "conn-ibss: no peer within {} ms, tearing down",
            self.connect_timeout_ms
        );
        Some(self.fire(IbssEvent::Disconnect))
    }

    pub fn reset(&mut self) {
        self.sm.reset(IbssState::Idle);
    }
}

struct IbssTable;

impl<'a> TransitionTable<IbssState, IbssEvent, ConnCtx<'a>> for IbssTable {
    fn lookup(&self, state: IbssState, event: IbssEvent) -> Option<IbssTransition<'a>> {
        use IbssEvent as E;
        use IbssState as S;

        let (next, action): (IbssState, Action<ConnCtx<'a>, IbssEvent>) = match (state, event) {
            (S::Idle, E::Create) => (S::SelfWait, create),
            (S::Idle, E::Connect) => (S::RsnWait, connect),
            (S::Idle, E::Disconnect) => (S::Idle, nop),

            (S::SelfWait, E::Disconnect) => (S::WaitDisconnectComplete, self_wait_disconnect),
            (S::SelfWait, E::PeerJoined) => (S::RsnWait, peer_joined),
            (S::SelfWait, E::Merge) => (S::RsnWait, self_wait_merge),

            (S::RsnWait, E::Disconnect) => (S::WaitDisconnectComplete, rsn_wait_disconnect),
            (S::RsnWait, E::RsnSuccess) => (S::Connected, rsn_success),
            (S::RsnWait, E::Merge) => (S::RsnWait, merge),

            (S::Connected, E::Disconnect) => (S::WaitDisconnectComplete, connected_disconnect),
            (S::Connected, E::Merge) => (S::Connected, merge),

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

fn create(ctx: &mut ConnCtx<'_>) -> Next {
    let ms = ctx.connect_timeout_ms;
    run(
        ctx,
        &[
            Join(JoinKind::SelfStart),
            StartConnectTimer { ms },
            NotifyAssociated,
        ],
    )
}

fn connect(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[Join(JoinKind::Join), SetPort(PortStatus::EapolOnly), StartRsn],
    )
}

fn self_wait_disconnect(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[
            StopConnectTimer,
            RemoveSelfSite,
            SetPort(PortStatus::Closed),
            DisconnectFirmware,
        ],
    )
}

fn peer_joined(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[StopConnectTimer, SetPort(PortStatus::EapolOnly), StartRsn],
    )
}

fn self_wait_merge(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[
            StopConnectTimer,
            Join(JoinKind::Merge),
            SetPort(PortStatus::EapolOnly),
            StartRsn,
        ],
    )
}

fn rsn_wait_disconnect(ctx: &mut ConnCtx<'_>) -> Next {
    run(
        ctx,
        &[StopRsn, SetPort(PortStatus::Closed), DisconnectFirmware],
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

/// Timing re-sync only; topology and security state stay as they are.
fn merge(ctx: &mut ConnCtx<'_>) -> Next {
    run(ctx, &[Join(JoinKind::Merge)])
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
