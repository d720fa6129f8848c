use super::{
    candidates::CandidateLists,
    machine::{RoamingCtx, RoamingData},
    tables::RoamingMode,
    types::{
        ConnectionStatus, RoamingAction, RoamingActions, RoamingEvent, RoamingOutput,
        RoamingState, ScanStatus, ScanType,
    },
};
use crate::{
    config::RoamingConfig,
    error::RoamError,
    gen_sm::{SmLabel, StateMachine},
    services::BssView,
    triggers::RoamingTrigger,
    types::{MacAddr, RoamTarget},
};

/// Aggregates triggers into at most one roam attempt at a time and drives the
/// scan/select/handover loop. Every entry point runs one dispatch step and
/// returns the commands it produced.
pub struct RoamingEngine {
    mode: RoamingMode,
    sm: StateMachine<RoamingState, RoamingEvent>,
    data: RoamingData,
}

impl RoamingEngine {
    pub fn new(config: &RoamingConfig) -> Self {
        let mode = RoamingMode::from(config.mode);
        Self {
            mode,
            sm: StateMachine::new(mode.name(), RoamingState::Idle),
            data: RoamingData::new(config),
        }
    }

    pub fn mode(&self) -> RoamingMode {
        self.mode
    }

    pub fn state(&self) -> RoamingState {
        self.sm.current()
    }

    pub fn machine(&self) -> &StateMachine<RoamingState, RoamingEvent> {
        &self.sm
    }

    pub fn pending_trigger(&self) -> RoamingTrigger {
        self.data.pending_trigger
    }

    pub fn is_masked(&self) -> bool {
        self.data.mask_events
    }

    pub fn scan_type(&self) -> ScanType {
        self.data.scan_type
    }

    pub fn low_quality_trigger_timestamp(&self) -> Option<u64> {
        self.data.low_quality_trigger_timestamp
    }

    pub fn candidates(&self) -> &CandidateLists {
        &self.data.candidates
    }

    pub fn target(&self) -> Option<&RoamTarget> {
        self.data.target.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.data.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        info!("{}: enabled={}", self.mode.name(), enabled);
        self.data.enabled = enabled;
    }

    pub fn on_trigger(
        &mut self,
        trigger: RoamingTrigger,
        reason: u16,
        now_ms: u64,
        view: &dyn BssView,
    ) -> RoamingOutput {
        let mut actions = RoamingActions::new();
        let state = self.sm.current();

        if trigger == RoamingTrigger::None {
            return self.output(actions);
        }

        if trigger.is_bg_scan() {
            if state != RoamingState::Idle {
                actions.push(RoamingAction::QualityHint {
                    low: trigger == RoamingTrigger::LowQualityForBgScan,
                });
            }
            return self.output(actions);
        }

        if !self.data.enabled || state == RoamingState::Idle {
            info!(
                "{}: {} dropped in {} (enabled={})",
                self.mode.name(),
                trigger.name(),
                state.name(),
                self.data.enabled
            );
            return self.output(actions);
        }

        let masked = self.data.mask_events;
        if !masked && trigger.is_low_quality() {
            if let Some(stamp) = self.data.low_quality_trigger_timestamp {
                let elapsed = now_ms.saturating_sub(stamp);
                if elapsed < self.data.debounce_window_ms {
                    info!(
                        "{}: {} debounced, {} ms since last attempt",
                        self.mode.name(),
                        trigger.name(),
                        elapsed
                    );
                    return self.output(actions);
                }
            }
        }

        if trigger > self.data.pending_trigger {
            self.data.pending_trigger = trigger;
        }
        if trigger.is_loss() {
            self.data.low_quality_trigger_timestamp = None;
        }

        if !masked {
            debug!(
                "{}: {} accepted, reason={}",
                self.mode.name(),
                trigger.name(),
                reason
            );
            if trigger.is_low_quality() {
                self.data.low_quality_trigger_timestamp = Some(now_ms);
            }
            self.data.mask_events = true;
            self.fire(RoamingEvent::RoamTrigger, view, &mut actions);
        } else if trigger.is_full_connect() {
            info!(
                "{}: {} pre-empts attempt in {}",
                self.mode.name(),
                trigger.name(),
                state.name()
            );
            self.fire(RoamingEvent::RoamTrigger, view, &mut actions);
        } else {
            debug!(
                "{}: {} folded into masked attempt, pending={}",
                self.mode.name(),
                trigger.name(),
                self.data.pending_trigger.name()
            );
        }

        self.output(actions)
    }

    /// Scan-manager completion. Only meaningful while a scan is outstanding.
    pub fn on_scan_complete(&mut self, status: ScanStatus, view: &dyn BssView) -> RoamingOutput {
        let mut actions = RoamingActions::new();
        if self.sm.current() != RoamingState::Scanning {
            warn!(
                "{}: scan completion ignored in {}",
                self.mode.name(),
                self.sm.current().name()
            );
            return self.output(actions);
        }

        self.data
            .candidates
            .rebuild(view, self.data.ap_quality_threshold_dbm);
        self.data.candidate_index = None;
        let have_candidates = !self.data.candidates.is_empty();
        let current = self.data.scan_type;

        let event = match status {
            _ if have_candidates => {
                self.data.scan_type = ScanType::None;
                RoamingEvent::Select
            }
            ScanStatus::Ok if current.is_partial() => {
                self.data.scan_type = ScanType::Full;
                RoamingEvent::Scan
            }
            ScanStatus::Ok => RoamingEvent::Select,
            ScanStatus::Failed => match current.next_retry() {
                Some(next) => {
                    self.data.scan_type = next;
                    RoamingEvent::Scan
                }
                None => RoamingEvent::Select,
            },
        };

        if event == RoamingEvent::Scan {
            info!(
                "{}: scan {:?} without candidates, escalating {} -> {}",
                self.mode.name(),
                status,
                current.name(),
                self.data.scan_type.name()
            );
        }
        self.fire(event, view, &mut actions);
        self.output(actions)
    }

    pub fn on_connection_status(
        &mut self,
        status: ConnectionStatus,
        view: &dyn BssView,
    ) -> RoamingOutput {
        let mut actions = RoamingActions::new();
        let event = self.mode.status_event(status);
        self.fire(event, view, &mut actions);
        self.output(actions)
    }

    /// Application-requested scan. Manual mode only.
    pub fn immediate_scan(
        &mut self,
        full: bool,
        view: &dyn BssView,
    ) -> Result<RoamingOutput, RoamError> {
        self.ready_for_command()?;
        let mut actions = RoamingActions::new();
        self.data.scan_type = if full {
            ScanType::Full
        } else {
            ScanType::Partial
        };
        self.fire(RoamingEvent::Scan, view, &mut actions);
        Ok(self.output(actions))
    }

    /// Application-chosen handover target. Manual mode only; `bssid` must be in
    /// the current BSS list and the site table.
    pub fn roam_to(
        &mut self,
        bssid: MacAddr,
        view: &dyn BssView,
    ) -> Result<RoamingOutput, RoamError> {
        self.ready_for_command()?;
        if !view.bss_list().iter().any(|entry| entry.bssid == bssid) {
            warn!("{}: roam_to {} not in bss list", self.mode.name(), bssid);
            return Err(RoamError::UnknownBss(bssid));
        }
        let site = view.site(&bssid).ok_or(RoamError::UnknownBss(bssid))?;
        self.data.target = Some(RoamTarget::from_site(&site)?);

        let mut actions = RoamingActions::new();
        self.fire(RoamingEvent::RequestHandover, view, &mut actions);
        Ok(self.output(actions))
    }

    fn ready_for_command(&self) -> Result<(), RoamError> {
        if self.mode != RoamingMode::Manual {
            return Err(RoamError::WrongMode);
        }
        match self.sm.current() {
            RoamingState::WaitForCommand => Ok(()),
            RoamingState::Idle => Err(RoamError::NotConnected),
            _ => Err(RoamError::Busy),
        }
    }

    pub fn dump(&self) {
        info!(
            "{}: pending={} masked={} scan={} candidates={} enabled={}",
            self.mode.name(),
            self.data.pending_trigger.name(),
            self.data.mask_events,
            self.data.scan_type.name(),
            self.data.candidates.len(),
            self.data.enabled
        );
        self.sm.dump();
    }

    fn fire(&mut self, event: RoamingEvent, view: &dyn BssView, actions: &mut RoamingActions) {
        let mut ctx = RoamingCtx {
            data: &mut self.data,
            view,
            actions,
        };
        self.sm.fire(&self.mode, event, &mut ctx);
    }

    fn output(&self, actions: RoamingActions) -> RoamingOutput {
        RoamingOutput {
            actions,
            state: self.sm.current(),
        }
    }
}
