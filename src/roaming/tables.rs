use super::{
    machine::{
        attempt_failed, handover, handover_success, invoke_scan, redirect, report_trigger,
        retry_handover, roam_trigger, scan_results, select, start, stop, stop_while_scanning,
        RoamingCtx,
    },
    types::{ConnectionStatus, RoamingEvent, RoamingState},
};
use crate::{
    config::OperationalMode,
    gen_sm::{nop, Action, Transition, TransitionTable},
};

type RoamTransition<'a> = Transition<RoamingState, RoamingEvent, RoamingCtx<'a>>;

/// The two roaming personalities. Each variant is its own transition table;
/// the mode is fixed when the engine is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoamingMode {
    Auto,
    Manual,
}

impl From<OperationalMode> for RoamingMode {
    fn from(mode: OperationalMode) -> Self {
        match mode {
            OperationalMode::Auto => Self::Auto,
            OperationalMode::Manual => Self::Manual,
        }
    }
}

impl RoamingMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Auto => "roaming-auto",
            Self::Manual => "roaming-manual",
        }
    }

    /// State entered on `Start`.
    pub fn ready_state(self) -> RoamingState {
        match self {
            Self::Auto => RoamingState::WaitForTrigger,
            Self::Manual => RoamingState::WaitForCommand,
        }
    }

    pub fn status_event(self, status: ConnectionStatus) -> RoamingEvent {
        match (self, status) {
            (_, ConnectionStatus::Connected) => RoamingEvent::Start,
            (_, ConnectionStatus::NotConnected) => RoamingEvent::Stop,
            (_, ConnectionStatus::HandoverSuccess) => RoamingEvent::RoamSuccess,
            (Self::Auto, ConnectionStatus::HandoverFailure) => RoamingEvent::RequestHandover,
            (Self::Manual, ConnectionStatus::HandoverFailure) => RoamingEvent::Failure,
        }
    }
}

impl<'a> TransitionTable<RoamingState, RoamingEvent, RoamingCtx<'a>> for RoamingMode {
    fn lookup(&self, state: RoamingState, event: RoamingEvent) -> Option<RoamTransition<'a>> {
        match self {
            Self::Auto => auto_transition(state, event),
            Self::Manual => manual_transition(state, event),
        }
    }
}

fn to<'a>(
    next: RoamingState,
    action: Action<RoamingCtx<'a>, RoamingEvent>,
) -> Option<RoamTransition<'a>> {
    Some(Transition::new(next, action))
}

fn auto_transition<'a>(state: RoamingState, event: RoamingEvent) -> Option<RoamTransition<'a>> {
    use RoamingEvent as E;
    use RoamingState as S;

    match (state, event) {
        (S::Idle, E::Start) => to(S::WaitForTrigger, start),
        (S::Idle, E::Stop) => to(S::Idle, nop),

        (S::WaitForTrigger, E::Stop) => to(S::Idle, stop),
        (S::WaitForTrigger, E::RoamTrigger) => to(S::Scanning, roam_trigger),

        (S::Scanning, E::Stop) => to(S::Idle, stop_while_scanning),
        (S::Scanning, E::RoamTrigger) => to(S::Scanning, redirect),
        (S::Scanning, E::Scan) => to(S::Scanning, invoke_scan),
        (S::Scanning, E::Select) => to(S::Selecting, select),
        (S::Scanning, E::Failure) => to(S::WaitForTrigger, attempt_failed),

        (S::Selecting, E::Stop) => to(S::Idle, stop),
        (S::Selecting, E::RoamTrigger) => to(S::Selecting, nop),
        (S::Selecting, E::RequestHandover) => to(S::Connecting, handover),
        (S::Selecting, E::Failure) => to(S::WaitForTrigger, attempt_failed),

        (S::Connecting, E::Stop) => to(S::Idle, stop),
        (S::Connecting, E::RoamTrigger) => to(S::Connecting, nop),
        (S::Connecting, E::RequestHandover) => to(S::Connecting, retry_handover),
        (S::Connecting, E::RoamSuccess) => to(S::WaitForTrigger, handover_success),
        (S::Connecting, E::Failure) => to(S::WaitForTrigger, attempt_failed),

        _ => None,
    }
}

fn manual_transition<'a>(state: RoamingState, event: RoamingEvent) -> Option<RoamTransition<'a>> {
    use RoamingEvent as E;
    use RoamingState as S;

    match (state, event) {
        (S::Idle, E::Start) => to(S::WaitForCommand, start),
        (S::Idle, E::Stop) => to(S::Idle, nop),

        (S::WaitForCommand, E::Stop) => to(S::Idle, stop),
        (S::WaitForCommand, E::RoamTrigger) => to(S::WaitForCommand, report_trigger),
        (S::WaitForCommand, E::Scan) => to(S::Scanning, invoke_scan),
        (S::WaitForCommand, E::RequestHandover) => to(S::Connecting, handover),

        (S::Scanning, E::Stop) => to(S::Idle, stop_while_scanning),
        (S::Scanning, E::RoamTrigger) => to(S::Scanning, report_trigger),
        (S::Scanning, E::Scan) => to(S::Scanning, invoke_scan),
        (S::Scanning, E::Select) => to(S::WaitForCommand, scan_results),
        (S::Scanning, E::Failure) => to(S::WaitForCommand, attempt_failed),

        (S::Connecting, E::Stop) => to(S::Idle, stop),
        (S::Connecting, E::RoamTrigger) => to(S::Connecting, report_trigger),
        (S::Connecting, E::RoamSuccess) => to(S::WaitForCommand, handover_success),
        (S::Connecting, E::Failure) => to(S::WaitForCommand, attempt_failed),

        _ => None,
    }
}
