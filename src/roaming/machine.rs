use super::{
    candidates::CandidateLists,
    types::{RoamingAction, RoamingActions, RoamingEvent, ScanType},
};
use crate::{
    config::RoamingConfig,
    services::BssView,
    triggers::RoamingTrigger,
    types::{Dbm, RoamTarget},
};

/// Per-attempt and per-connection bookkeeping of the roaming engine.
#[derive(Clone, Debug)]
pub struct RoamingData {
    pub enabled: bool,
    pub pending_trigger: RoamingTrigger,
    /// Set from "trigger accepted" until the attempt's terminal outcome.
    pub mask_events: bool,
    pub scan_type: ScanType,
    pub low_quality_trigger_timestamp: Option<u64>,
    pub debounce_window_ms: u64,
    pub ap_quality_threshold_dbm: Dbm,
    pub candidate_index: Option<usize>,
    pub candidates: CandidateLists,
    pub target: Option<RoamTarget>,
}

impl RoamingData {
    pub fn new(config: &RoamingConfig) -> Self {
        Self {
            enabled: config.enabled,
            pending_trigger: RoamingTrigger::None,
            mask_events: false,
            scan_type: ScanType::None,
            low_quality_trigger_timestamp: None,
            debounce_window_ms: config.debounce_window_ms(),
            ap_quality_threshold_dbm: config.ap_quality_threshold_dbm,
            candidate_index: None,
            candidates: CandidateLists::new(),
            target: None,
        }
    }

    pub(super) fn end_attempt(&mut self) {
        self.mask_events = false;
        self.pending_trigger = RoamingTrigger::None;
        self.scan_type = ScanType::None;
        self.candidate_index = None;
        self.candidates.clear();
        self.target = None;
    }

    pub(super) fn reset(&mut self) {
        self.end_attempt();
        self.low_quality_trigger_timestamp = None;
    }
}

/// Everything an action may touch during one dispatch step.
pub struct RoamingCtx<'a> {
    pub data: &'a mut RoamingData,
    pub view: &'a dyn BssView,
    pub actions: &'a mut RoamingActions,
}

type Next = Option<RoamingEvent>;

pub(super) fn start(ctx: &mut RoamingCtx<'_>) -> Next {
    ctx.data.reset();
    None
}

pub(super) fn stop(ctx: &mut RoamingCtx<'_>) -> Next {
    ctx.data.reset();
    None
}

pub(super) fn stop_while_scanning(ctx: &mut RoamingCtx<'_>) -> Next {
    ctx.actions.push(RoamingAction::AbortScan);
    ctx.data.reset();
    None
}

/// Starts an attempt. Causes above the fast-connect group skip the scan when the
/// last BSS list already yields candidates.
pub(super) fn roam_trigger(ctx: &mut RoamingCtx<'_>) -> Next {
    let trigger = ctx.data.pending_trigger;
    if trigger.is_full_connect() {
        ctx.data
            .candidates
            .rebuild(ctx.view, ctx.data.ap_quality_threshold_dbm);
        ctx.data.candidate_index = None;
        if !ctx.data.candidates.is_empty() {
            info!(
                "roaming: fast connect for {} over {} candidates",
                trigger.name(),
                ctx.data.candidates.len()
            );
            ctx.data.scan_type = ScanType::None;
            return Some(RoamingEvent::Select);
        }
    }

    info!("roaming: attempt for {} starts with partial scan", trigger.name());
    ctx.data.scan_type = ScanType::Partial;
    Some(RoamingEvent::Scan)
}

pub(super) fn redirect(ctx: &mut RoamingCtx<'_>) -> Next {
    info!(
        "roaming: redirecting scan for {}",
        ctx.data.pending_trigger.name()
    );
    ctx.actions.push(RoamingAction::AbortScan);
    roam_trigger(ctx)
}

pub(super) fn invoke_scan(ctx: &mut RoamingCtx<'_>) -> Next {
    if ctx.data.scan_type == ScanType::None {
        ctx.data.scan_type = ScanType::Partial;
    }
    ctx.actions
        .push(RoamingAction::RequestScan(ctx.data.scan_type));
    None
}

pub(super) fn select(ctx: &mut RoamingCtx<'_>) -> Next {
    if advance_target(ctx) {
        Some(RoamingEvent::RequestHandover)
    } else {
        warn!(
            "roaming: no candidate for {}",
            ctx.data.pending_trigger.name()
        );
        Some(RoamingEvent::Failure)
    }
}

pub(super) fn handover(ctx: &mut RoamingCtx<'_>) -> Next {
    ctx.actions.push(RoamingAction::ConnectToTarget);
    None
}

pub(super) fn retry_handover(ctx: &mut RoamingCtx<'_>) -> Next {
    if advance_target(ctx) {
        ctx.actions.push(RoamingAction::ConnectToTarget);
        None
    } else {
        warn!("roaming: handover candidates exhausted");
        Some(RoamingEvent::Failure)
    }
}

pub(super) fn handover_success(ctx: &mut RoamingCtx<'_>) -> Next {
    if let Some(target) = ctx.data.target.as_ref() {
        info!("roaming: handover to {} complete", target.bssid);
        ctx.actions.push(RoamingAction::ReportRoamSuccess {
            bssid: target.bssid,
        });
    }
    ctx.data.end_attempt();
    None
}

pub(super) fn attempt_failed(ctx: &mut RoamingCtx<'_>) -> Next {
    let trigger = ctx.data.pending_trigger;
    ctx.actions.push(RoamingAction::ReportRoamFailure {
        trigger,
        disconnect: trigger.is_loss(),
    });
    ctx.data.end_attempt();
    None
}

/// Manual mode: the application decides, so the attempt ends at the report.
pub(super) fn report_trigger(ctx: &mut RoamingCtx<'_>) -> Next {
    ctx.actions
        .push(RoamingAction::ReportTrigger(ctx.data.pending_trigger));
    ctx.data.mask_events = false;
    ctx.data.pending_trigger = RoamingTrigger::None;
    None
}

pub(super) fn scan_results(ctx: &mut RoamingCtx<'_>) -> Next {
    ctx.data.scan_type = ScanType::None;
    ctx.actions.push(RoamingAction::ReportScanResults {
        candidates: ctx.data.candidates.len(),
    });
    None
}

/// Moves the cursor to the next candidate that still resolves in the site table
/// and copies it into the attempt as the roam target.
fn advance_target(ctx: &mut RoamingCtx<'_>) -> bool {
    let mut index = ctx.data.candidate_index.map_or(0, |i| i + 1);
    while let Some(candidate) = ctx.data.candidates.nth(index) {
        match ctx.view.site(&candidate.bssid).map(|site| RoamTarget::from_site(&site)) {
            Some(Ok(target)) => {
                debug!(
                    "roaming: candidate {} is {} at {} dBm",
                    index, target.bssid, target.rssi_dbm
                );
                ctx.data.candidate_index = Some(index);
                ctx.data.target = Some(target);
                return true;
            }
            Some(Err(err)) => warn!("roaming: skipping {}: {}", candidate.bssid, err),
            None => warn!("roaming: {} left the site table", candidate.bssid),
        }
        index += 1;
    }

    ctx.data.candidate_index = Some(index);
    ctx.data.target = None;
    false
}
