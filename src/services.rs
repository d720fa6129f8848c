//! Collaborators the core drives but does not own: scan manager, site table,
//! firmware link layer, key exchange, link supervision and upward delivery.
//!
//! All calls are fire-and-forget. Completions come back later as
//! [`crate::DriverEvent`]s posted to the station queue.

use crate::{
    conn::{JoinKind, PortStatus},
    error::RoamError,
    roaming::ScanType,
    triggers::{ClientId, RoamingTrigger, TriggerParams, TriggerPayload},
    types::{BssEntry, MacAddr, RoamTarget, SiteRecord},
};

/// Read access to the scan manager's BSS list and the site table.
pub trait BssView {
    fn bss_list(&self) -> &[BssEntry];
    fn site(&self, bssid: &MacAddr) -> Option<SiteRecord<'_>>;
    fn current_bssid(&self) -> Option<MacAddr>;
}

pub trait ScanControl {
    fn request_scan(&mut self, scan_type: ScanType);
    fn abort_scan(&mut self);
    /// Background-scan pacing hint. `low` selects the aggressive interval.
    fn set_quality_hint(&mut self, low: bool);
}

pub trait FirmwareLink {
    fn arm_trigger(&mut self, slot: u8, params: &TriggerParams) -> Result<(), RoamError>;
    fn disarm_trigger(&mut self, slot: u8);
    fn configure_bss_loss(&mut self, missed_beacons: u32) -> Result<(), RoamError>;
    fn configure_tx_retry(&mut self, retry_count: u32) -> Result<(), RoamError>;
    fn join(&mut self, kind: JoinKind, target: Option<&RoamTarget>);
    fn start_mlme(&mut self);
    fn disconnect_firmware(&mut self);
    fn set_port(&mut self, status: PortStatus);
}

pub trait RsnControl {
    fn start_rsn(&mut self);
    fn stop_rsn(&mut self);
}

pub trait LinkSupervisor {
    fn start_traffic_monitor(&mut self);
    fn stop_traffic_monitor(&mut self);
    fn set_health_connected(&mut self, connected: bool);
    fn start_connect_timer(&mut self, timeout_ms: u32);
    fn stop_connect_timer(&mut self);
    fn remove_self_site(&mut self);
}

pub trait EventSink {
    fn deliver(&mut self, event: UpwardEvent);
}

pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Everything a [`crate::Station`] needs from its environment.
pub trait StationServices:
    BssView + ScanControl + FirmwareLink + RsnControl + LinkSupervisor + EventSink + Clock
{
}

impl<T> StationServices for T where
    T: BssView + ScanControl + FirmwareLink + RsnControl + LinkSupervisor + EventSink + Clock
{
}

/// Notifications forwarded to user space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpwardEvent {
    ExternalTrigger {
        client_id: ClientId,
        slot: u8,
        payload: TriggerPayload,
    },
    RoamingTrigger(RoamingTrigger),
    ScanResults {
        candidates: usize,
    },
    RoamSucceeded {
        bssid: MacAddr,
    },
    RoamFailed {
        trigger: RoamingTrigger,
    },
    Associated,
    Connected,
    Disconnected,
    ConnectTimeout,
}
