use wlan_roam::{
    conn::{JoinKind, PortStatus},
    roaming::ScanType,
    services::{
        BssView, Clock, EventSink, FirmwareLink, LinkSupervisor, RsnControl, ScanControl,
        UpwardEvent,
    },
    triggers::TriggerParams,
    BssEntry, MacAddr, RoamError, RoamTarget, SiteRecord,
};

/// Placeholder beacon body handed out for every site lookup.
const BEACON: [u8; 12] = [0x00, 0x04, b'r', b'o', b'a', b'm', 0x01, 0x02, 0x82, 0x84, 0x03, 0x01];

/// Collaborators that only record what the station asked of them.
#[derive(Default)]
pub struct SimServices {
    pub bss: Vec<BssEntry>,
    pub current: Option<MacAddr>,
    pub now_ms: u64,
    log: Vec<String>,
}

impl SimServices {
    pub fn upsert(&mut self, entry: BssEntry) {
        match self.bss.iter_mut().find(|e| e.bssid == entry.bssid) {
            Some(existing) => *existing = entry,
            None => self.bss.push(entry),
        }
    }

    pub fn take_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.log)
    }

    fn record(&mut self, line: String) {
        log::debug!("{line}");
        self.log.push(line);
    }
}

impl BssView for SimServices {
    fn bss_list(&self) -> &[BssEntry] {
        &self.bss
    }

    fn site(&self, bssid: &MacAddr) -> Option<SiteRecord<'_>> {
        let entry = self.bss.iter().find(|e| e.bssid == *bssid)?;
        Some(SiteRecord {
            bssid: entry.bssid,
            channel: entry.channel,
            rssi_dbm: entry.rssi_dbm,
            beacon_interval_tu: 100,
            capabilities: 0x0401,
            frame: &BEACON,
        })
    }

    fn current_bssid(&self) -> Option<MacAddr> {
        self.current
    }
}

impl ScanControl for SimServices {
    fn request_scan(&mut self, scan_type: ScanType) {
        self.record(format!("scan {}", scan_type.name()));
    }

    fn abort_scan(&mut self) {
        self.record("scan abort".into());
    }

    fn set_quality_hint(&mut self, low: bool) {
        self.record(format!("bg-scan {}", if low { "low" } else { "normal" }));
    }
}

impl FirmwareLink for SimServices {
    fn arm_trigger(&mut self, slot: u8, params: &TriggerParams) -> Result<(), RoamError> {
        self.record(format!(
            "arm {slot} {:?} {:?} {}",
            params.metric, params.direction, params.threshold
        ));
        Ok(())
    }

    fn disarm_trigger(&mut self, slot: u8) {
        self.record(format!("disarm {slot}"));
    }

    fn configure_bss_loss(&mut self, missed_beacons: u32) -> Result<(), RoamError> {
        self.record(format!("bss-loss {missed_beacons}"));
        Ok(())
    }

    fn configure_tx_retry(&mut self, retry_count: u32) -> Result<(), RoamError> {
        self.record(format!("tx-retry {retry_count}"));
        Ok(())
    }

    fn join(&mut self, kind: JoinKind, target: Option<&RoamTarget>) {
        match target {
            Some(target) => {
                self.current = Some(target.bssid);
                self.record(format!("join {kind:?} {}", target.bssid));
            }
            None => self.record(format!("join {kind:?}")),
        }
    }

    fn start_mlme(&mut self) {
        self.record("mlme start".into());
    }

    fn disconnect_firmware(&mut self) {
        self.current = None;
        self.record("fw disconnect".into());
    }

    fn set_port(&mut self, status: PortStatus) {
        self.record(format!("port {status:?}"));
    }
}

impl RsnControl for SimServices {
    fn start_rsn(&mut self) {
        self.record("rsn start".into());
    }

    fn stop_rsn(&mut self) {
        self.record("rsn stop".into());
    }
}

impl LinkSupervisor for SimServices {
    fn start_traffic_monitor(&mut self) {
        self.record("traffic-monitor start".into());
    }

    fn stop_traffic_monitor(&mut self) {
        self.record("traffic-monitor stop".into());
    }

    fn set_health_connected(&mut self, connected: bool) {
        self.record(format!("health connected={connected}"));
    }

    fn start_connect_timer(&mut self, timeout_ms: u32) {
        self.record(format!("timer start {timeout_ms}"));
    }

    fn stop_connect_timer(&mut self) {
        self.record("timer stop".into());
    }

    fn remove_self_site(&mut self) {
        self.record("site remove-self".into());
    }
}

impl EventSink for SimServices {
    fn deliver(&mut self, event: UpwardEvent) {
        let line = match event {
            UpwardEvent::ExternalTrigger {
                client_id,
                slot,
                payload,
            } => format!("up client-trigger {client_id} slot={slot} level={}", payload.level),
            UpwardEvent::RoamingTrigger(trigger) => format!("up trigger {}", trigger.name()),
            UpwardEvent::ScanResults { candidates } => format!("up scan-results {candidates}"),
            UpwardEvent::RoamSucceeded { bssid } => format!("up roam-ok {bssid}"),
            UpwardEvent::RoamFailed { trigger } => format!("up roam-failed {}", trigger.name()),
            UpwardEvent::Associated => "up associated".into(),
            UpwardEvent::Connected => "up connected".into(),
            UpwardEvent::Disconnected => "up disconnected".into(),
            UpwardEvent::ConnectTimeout => "up connect-timeout".into(),
        };
        self.record(line);
    }
}

impl Clock for SimServices {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}
