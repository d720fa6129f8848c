use super::*;
use crate::{
    config::{IbssConfig, OperationalMode, TriggerThresholds},
    conn::{IbssState, InfraState, JoinKind, PortStatus},
    roaming::{RoamingState, ScanType},
    services::{BssView, Clock, FirmwareLink, LinkSupervisor, RsnControl, ScanControl},
    triggers::SlotOwner,
    types::{BssEntry, SiteRecord},
};

const HOME: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x01]);
const AP_A: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0a]);
const AP_B: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0b]);
const AP_C: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0c]);

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Scan(ScanType),
    AbortScan,
    Hint(bool),
    Arm(u8),
    Disarm(u8),
    BssLoss(u32),
    TxRetry(u32),
    Join(JoinKind, Option<MacAddr>),
    StartMlme,
    DisconnectFirmware,
    Port(PortStatus),
    StartRsn,
    StopRsn,
    StartMonitor,
    StopMonitor,
    Health(bool),
    StartTimer(u32),
    StopTimer,
    RemoveSelfSite,
    Up(UpwardEvent),
}

#[derive(Default)]
struct Mock {
    calls: Vec<Call>,
    list: Vec<BssEntry>,
    current: Option<MacAddr>,
    now: u64,
    reject_bss_loss: bool,
}

impl Mock {
    fn with_aps() -> Self {
        let mut neighbor = BssEntry::infrastructure(AP_A, 1, -55);
        neighbor.in_neighbor_list = true;
        Self {
            list: vec![
                BssEntry::infrastructure(HOME, 6, -45),
                neighbor,
                BssEntry::infrastructure(AP_B, 36, -58),
                BssEntry::infrastructure(AP_C, 44, -64),
            ],
            current: Some(HOME),
            ..Self::default()
        }
    }

    fn upward(&self) -> Vec<UpwardEvent> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Up(event) => Some(*event),
                _ => None,
            })
            .collect()
    }

    fn joins(&self) -> Vec<(JoinKind, Option<MacAddr>)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Join(kind, bssid) => Some((*kind, *bssid)),
                _ => None,
            })
            .collect()
    }
}

impl BssView for Mock {
    fn bss_list(&self) -> &[BssEntry] {
        &self.list
    }

    fn site(&self, bssid: &MacAddr) -> Option<SiteRecord<'_>> {
        self.list
            .iter()
            .find(|entry| entry.bssid == *bssid)
            .map(|entry| SiteRecord {
                bssid: entry.bssid,
                channel: entry.channel,
                rssi_dbm: entry.rssi_dbm,
                beacon_interval_tu: 100,
                capabilities: 0x0011,
                frame: &[0x00, 0x01],
            })
    }

    fn current_bssid(&self) -> Option<MacAddr> {
        self.current
    }
}

impl ScanControl for Mock {
    fn request_scan(&mut self, scan_type: ScanType) {
        self.calls.push(Call::Scan(scan_type));
    }

    fn abort_scan(&mut self) {
        self.calls.push(Call::AbortScan);
    }

    fn set_quality_hint(&mut self, low: bool) {
        self.calls.push(Call::Hint(low));
    }
}

impl FirmwareLink for Mock {
    fn arm_trigger(&mut self, slot: u8, _: &TriggerParams) -> Result<(), RoamError> {
        self.calls.push(Call::Arm(slot));
        Ok(())
    }

    fn disarm_trigger(&mut self, slot: u8) {
        self.calls.push(Call::Disarm(slot));
    }

    fn configure_bss_loss(&mut self, missed_beacons: u32) -> Result<(), RoamError> {
        if self.reject_bss_loss {
            return Err(RoamError::Firmware);
        }
        self.calls.push(Call::BssLoss(missed_beacons));
        Ok(())
    }

    fn configure_tx_retry(&mut self, retry_count: u32) -> Result<(), RoamError> {
        self.calls.push(Call::TxRetry(retry_count));
        Ok(())
    }

    fn join(&mut self, kind: JoinKind, target: Option<&RoamTarget>) {
        self.calls.push(Call::Join(kind, target.map(|t| t.bssid)));
        if let Some(target) = target {
            self.current = Some(target.bssid);
        }
    }

    fn start_mlme(&mut self) {
        self.calls.push(Call::StartMlme);
    }

    fn disconnect_firmware(&mut self) {
        self.calls.push(Call::DisconnectFirmware);
    }

    fn set_port(&mut self, status: PortStatus) {
        self.calls.push(Call::Port(status));
    }
}

impl RsnControl for Mock {
    fn start_rsn(&mut self) {
        self.calls.push(Call::StartRsn);
    }

    fn stop_rsn(&mut self) {
        self.calls.push(Call::StopRsn);
    }
}

impl LinkSupervisor for Mock {
    fn start_traffic_monitor(&mut self) {
        self.calls.push(Call::StartMonitor);
    }

    fn stop_traffic_monitor(&mut self) {
        self.calls.push(Call::StopMonitor);
    }

    fn set_health_connected(&mut self, connected: bool) {
        self.calls.push(Call::Health(connected));
    }

    fn start_connect_timer(&mut self, timeout_ms: u32) {
        self.calls.push(Call::StartTimer(timeout_ms));
    }

    fn stop_connect_timer(&mut self) {
        self.calls.push(Call::StopTimer);
    }

    fn remove_self_site(&mut self) {
        self.calls.push(Call::RemoveSelfSite);
    }
}

impl EventSink for Mock {
    fn deliver(&mut self, event: UpwardEvent) {
        self.calls.push(Call::Up(event));
    }
}

impl Clock for Mock {
    fn now_ms(&self) -> u64 {
        self.now
    }
}

fn config(mode: OperationalMode) -> RoamingConfig {
    RoamingConfig {
        enabled: true,
        mode,
        low_pass_filter_secs: 30,
        ap_quality_threshold_dbm: -70,
        thresholds: TriggerThresholds {
            data_retry_count: 20,
            expected_missed_beacons: 10,
            low_rssi_dbm: -75,
            low_snr_db: 10,
            bg_scan_low_dbm: -80,
            bg_scan_normal_dbm: -70,
        },
        ibss: IbssConfig {
            connect_timeout_ms: 5_000,
        },
    }
}

fn post_all(station: &mut Station<Mock>, events: &[DriverEvent]) {
    for event in events {
        station.post(*event).unwrap();
    }
    assert_eq!(station.process_pending(), events.len());
}

const COMPLETE_JOIN: [DriverEvent; 3] = [
    DriverEvent::Infra(InfraEvent::JoinComplete),
    DriverEvent::Infra(InfraEvent::MlmeSuccess),
    DriverEvent::Infra(InfraEvent::RsnSuccess),
];

fn connected_station(mode: OperationalMode) -> Station<Mock> {
    let mut station = Station::init(Mock::with_aps(), &config(mode)).unwrap();
    station.connect(HOME).unwrap();
    post_all(&mut station, &COMPLETE_JOIN);
    assert_eq!(station.infra().state(), InfraState::Connected);
    station.services_mut().calls.clear();
    station
}

#[test]
fn init_binds_internal_slots_and_link_limits() {
    let station = Station::init(Mock::with_aps(), &config(OperationalMode::Auto)).unwrap();

    assert_eq!(
        station.services().calls,
        vec![
            Call::Arm(LOW_RSSI_SLOT),
            Call::Arm(LOW_SNR_SLOT),
            Call::Arm(BG_SCAN_LOW_SLOT),
            Call::Arm(BG_SCAN_NORMAL_SLOT),
            Call::BssLoss(10),
            Call::TxRetry(20),
        ]
    );
    for slot in 0..4 {
        assert_eq!(station.registry().owner(slot), Ok(SlotOwner::Internal));
    }
    assert_eq!(station.registry().owner(4), Ok(SlotOwner::Free));
}

#[test]
fn init_reports_firmware_rejection() {
    let mock = Mock {
        reject_bss_loss: true,
        ..Mock::with_aps()
    };
    assert!(matches!(
        Station::init(mock, &config(OperationalMode::Auto)),
        Err(RoamError::Firmware)
    ));
}

#[test]
fn infrastructure_connect_runs_join_mlme_rsn_sequence() {
    let mut station = Station::init(Mock::with_aps(), &config(OperationalMode::Auto)).unwrap();
    station.services_mut().calls.clear();

    station.connect(HOME).unwrap();
    post_all(&mut station, &COMPLETE_JOIN);

    assert_eq!(
        station.services().calls,
        vec![
            Call::Join(JoinKind::Infrastructure, Some(HOME)),
            Call::StartMlme,
            Call::Up(UpwardEvent::Associated),
            Call::Port(PortStatus::EapolOnly),
            Call::StartRsn,
            Call::StartMonitor,
            Call::Health(true),
            Call::Port(PortStatus::Open),
            Call::Up(UpwardEvent::Connected),
        ]
    );
    assert_eq!(station.roaming().state(), RoamingState::WaitForTrigger);
    assert_eq!(station.topology(), Topology::Infrastructure);
}

#[test]
fn low_rssi_slot_starts_a_roam_scan() {
    let mut station = connected_station(OperationalMode::Auto);

    post_all(
        &mut station,
        &[DriverEvent::LinkTrigger {
            slot: LOW_RSSI_SLOT,
            payload: TriggerPayload {
                level: -78,
                reason: 0,
            },
        }],
    );

    assert_eq!(station.services().calls, vec![Call::Scan(ScanType::Partial)]);
    assert_eq!(station.roaming().pending_trigger(), RoamingTrigger::LowQuality);
}

#[test]
fn background_slot_only_adjusts_scan_pacing() {
    let mut station = connected_station(OperationalMode::Auto);

    post_all(
        &mut station,
        &[DriverEvent::LinkTrigger {
            slot: BG_SCAN_LOW_SLOT,
            payload: TriggerPayload::default(),
        }],
    );

    assert_eq!(station.services().calls, vec![Call::Hint(true)]);
    assert_eq!(station.roaming().state(), RoamingState::WaitForTrigger);
}

#[test]
fn successful_roam_rejoins_best_candidate() {
    let mut station = connected_station(OperationalMode::Auto);

    post_all(
        &mut station,
        &[
            DriverEvent::LinkTrigger {
                slot: LOW_SNR_SLOT,
                payload: TriggerPayload::default(),
            },
            DriverEvent::ScanComplete(ScanStatus::Ok),
        ],
    );
    assert_eq!(station.roaming().state(), RoamingState::Connecting);
    assert_eq!(station.infra().state(), InfraState::WaitJoinComplete);
    assert_eq!(
        station.services().joins(),
        vec![(JoinKind::Handover, Some(AP_A))]
    );

    post_all(&mut station, &COMPLETE_JOIN);

    assert_eq!(station.roaming().state(), RoamingState::WaitForTrigger);
    assert!(!station.roaming().is_masked());
    assert_eq!(
        station.services().upward().last(),
        Some(&UpwardEvent::RoamSucceeded { bssid: AP_A })
    );
}

#[test]
fn exhausted_handover_after_bss_loss_disconnects() {
    let mut station = connected_station(OperationalMode::Auto);

    post_all(
        &mut station,
        &[
            DriverEvent::RoamingTrigger {
                trigger: RoamingTrigger::BssLoss,
                reason: 4,
            },
            DriverEvent::ScanComplete(ScanStatus::Ok),
            DriverEvent::HandoverFailed,
            DriverEvent::HandoverFailed,
            DriverEvent::HandoverFailed,
        ],
    );

    let joined: Vec<_> = station
        .services()
        .joins()
        .into_iter()
        .map(|(_, bssid)| bssid)
        .collect();
    assert_eq!(joined, vec![Some(AP_A), Some(AP_B), Some(AP_C)]);
    assert!(station
        .services()
        .upward()
        .contains(&UpwardEvent::RoamFailed {
            trigger: RoamingTrigger::BssLoss
        }));
    assert_eq!(
        station.services().calls.last(),
        Some(&Call::DisconnectFirmware)
    );
    assert_eq!(station.infra().state(), InfraState::WaitDisconnectComplete);
    assert_eq!(station.roaming().state(), RoamingState::Idle);

    post_all(
        &mut station,
        &[DriverEvent::Infra(InfraEvent::DisconnectComplete)],
    );
    assert_eq!(station.infra().state(), InfraState::Idle);
    assert_eq!(station.topology(), Topology::None);
    assert_eq!(
        station.services().upward().last(),
        Some(&UpwardEvent::Disconnected)
    );
}

#[test]
fn handover_failure_without_handover_is_ignored() {
    let mut station = connected_station(OperationalMode::Auto);
    post_all(&mut station, &[DriverEvent::HandoverFailed]);
    assert!(station.services().calls.is_empty());
    assert_eq!(station.roaming().state(), RoamingState::WaitForTrigger);
}

#[test]
fn external_client_triggers_are_forwarded_upward() {
    let mut station = connected_station(OperationalMode::Auto);
    let params = TriggerParams::falling(LinkMetric::Snr, 5);

    let slot = station.register_client_trigger(42, &params).unwrap();
    assert_eq!(slot, 4);
    assert_eq!(station.register_client_trigger(42, &params), Ok(4));

    let payload = TriggerPayload {
        level: 3,
        reason: 9,
    };
    post_all(&mut station, &[DriverEvent::LinkTrigger { slot, payload }]);

    assert_eq!(
        station.services().upward(),
        vec![UpwardEvent::ExternalTrigger {
            client_id: 42,
            slot,
            payload,
        }]
    );
    assert_eq!(station.roaming().state(), RoamingState::WaitForTrigger);

    assert_eq!(station.unregister_client_trigger(42), Ok(4));
    assert_eq!(station.services().calls.last(), Some(&Call::Disarm(4)));
}

#[test]
fn external_clients_fill_only_the_free_slots() {
    let mut station = connected_station(OperationalMode::Auto);
    let params = TriggerParams::falling(LinkMetric::Rssi, -60);

    for client in 1..=4u16 {
        station.register_client_trigger(client, &params).unwrap();
    }
    assert_eq!(
        station.register_client_trigger(5, &params),
        Err(RoamError::RegistryFull)
    );
}

#[test]
fn ibss_connect_timeout_tears_down_self_started_network() {
    let mut station = Station::init(Mock::with_aps(), &config(OperationalMode::Auto)).unwrap();
    station.services_mut().calls.clear();

    station.create_ibss().unwrap();
    assert_eq!(
        station.services().calls,
        vec![
            Call::Join(JoinKind::SelfStart, None),
            Call::StartTimer(5_000),
            Call::Up(UpwardEvent::Associated),
        ]
    );

    station.services_mut().calls.clear();
    post_all(&mut station, &[DriverEvent::ConnectTimeout]);
    assert_eq!(
        station.services().calls,
        vec![
            Call::Up(UpwardEvent::ConnectTimeout),
            Call::StopTimer,
            Call::RemoveSelfSite,
            Call::Port(PortStatus::Closed),
            Call::DisconnectFirmware,
        ]
    );
    assert_eq!(station.ibss().state(), IbssState::WaitDisconnectComplete);

    post_all(&mut station, &[DriverEvent::Ibss(IbssEvent::DisconnectComplete)]);
    assert_eq!(station.ibss().state(), IbssState::Idle);
    assert_eq!(station.topology(), Topology::None);
    assert_eq!(station.roaming().state(), RoamingState::Idle);
}

#[test]
fn ibss_peer_join_never_feeds_roaming() {
    let mut station = Station::init(Mock::with_aps(), &config(OperationalMode::Auto)).unwrap();
    station.create_ibss().unwrap();
    post_all(
        &mut station,
        &[
            DriverEvent::Ibss(IbssEvent::PeerJoined),
            DriverEvent::Ibss(IbssEvent::RsnSuccess),
        ],
    );
    assert_eq!(station.ibss().state(), IbssState::Connected);
    assert_eq!(station.roaming().state(), RoamingState::Idle);
}

#[test]
fn link_commands_check_topology() {
    let mut station = Station::init(Mock::with_aps(), &config(OperationalMode::Auto)).unwrap();
    let stranger = MacAddr([0x02, 0, 0, 0, 0, 0x77]);

    assert_eq!(station.disconnect(), Err(RoamError::NotConnected));
    assert_eq!(station.connect(stranger), Err(RoamError::UnknownBss(stranger)));

    station.connect(HOME).unwrap();
    assert_eq!(station.create_ibss(), Err(RoamError::Busy));
    assert_eq!(station.join_ibss(AP_A), Err(RoamError::Busy));
}

#[test]
fn queued_link_setup_events_are_refused() {
    let mut station = Station::init(Mock::with_aps(), &config(OperationalMode::Auto)).unwrap();
    station.services_mut().calls.clear();

    post_all(&mut station, &[DriverEvent::Infra(InfraEvent::Connect)]);
    post_all(&mut station, &COMPLETE_JOIN);

    assert!(station.services().calls.is_empty());
    assert_eq!(station.infra().state(), InfraState::Idle);
    assert_eq!(station.roaming().state(), RoamingState::Idle);
    assert_eq!(station.topology(), Topology::None);
}

#[test]
fn queued_ibss_create_cannot_start_a_second_topology() {
    let mut station = connected_station(OperationalMode::Auto);

    post_all(
        &mut station,
        &[
            DriverEvent::Ibss(IbssEvent::Create),
            DriverEvent::Ibss(IbssEvent::Connect),
            DriverEvent::Infra(InfraEvent::Handover),
            DriverEvent::Infra(InfraEvent::Disconnect),
        ],
    );

    assert!(station.services().calls.is_empty());
    assert_eq!(station.ibss().state(), IbssState::Idle);
    assert_eq!(station.infra().state(), InfraState::Connected);
    assert_eq!(station.topology(), Topology::Infrastructure);
    assert!(station.disconnect().is_ok());
}

#[test]
fn user_disconnect_stops_roaming_before_teardown() {
    let mut station = connected_station(OperationalMode::Auto);
    post_all(
        &mut station,
        &[DriverEvent::RoamingTrigger {
            trigger: RoamingTrigger::LowTxRate,
            reason: 0,
        }],
    );
    station.services_mut().calls.clear();

    station.disconnect().unwrap();

    assert_eq!(station.roaming().state(), RoamingState::Idle);
    assert_eq!(station.services().calls.first(), Some(&Call::AbortScan));
    assert_eq!(station.infra().state(), InfraState::WaitDisconnectComplete);
}

#[test]
fn manual_mode_roams_on_application_command() {
    let mut station = connected_station(OperationalMode::Manual);
    assert_eq!(station.roaming().state(), RoamingState::WaitForCommand);

    post_all(
        &mut station,
        &[DriverEvent::RoamingTrigger {
            trigger: RoamingTrigger::MaxTxRetries,
            reason: 0,
        }],
    );
    assert_eq!(
        station.services().upward(),
        vec![UpwardEvent::RoamingTrigger(RoamingTrigger::MaxTxRetries)]
    );

    station.immediate_scan(true).unwrap();
    post_all(&mut station, &[DriverEvent::ScanComplete(ScanStatus::Ok)]);
    assert!(station
        .services()
        .upward()
        .contains(&UpwardEvent::ScanResults { candidates: 3 }));

    station.roam_to(AP_B).unwrap();
    assert_eq!(
        station.services().joins(),
        vec![(JoinKind::Handover, Some(AP_B))]
    );
    post_all(&mut station, &COMPLETE_JOIN);
    assert_eq!(
        station.services().upward().last(),
        Some(&UpwardEvent::RoamSucceeded { bssid: AP_B })
    );
}

#[test]
fn queue_rejects_events_beyond_capacity() {
    let station = Station::new(Mock::default(), &config(OperationalMode::Auto));
    for _ in 0..QUEUE_DEPTH {
        station.post(DriverEvent::HandoverFailed).unwrap();
    }
    assert_eq!(
        station.post(DriverEvent::HandoverFailed),
        Err(RoamError::QueueFull)
    );
}

#[test]
fn process_pending_stops_at_shutdown() {
    let mut station = connected_station(OperationalMode::Auto);
    station.post(DriverEvent::HandoverFailed).unwrap();
    station.post(DriverEvent::Shutdown).unwrap();
    station.post(DriverEvent::HandoverFailed).unwrap();

    assert_eq!(station.process_pending(), 1);
    assert_eq!(station.process_pending(), 1);
    assert_eq!(station.process_pending(), 0);
}

#[test]
fn run_drains_queue_until_shutdown() {
    let mut station = Station::init(Mock::with_aps(), &config(OperationalMode::Auto)).unwrap();
    station.connect(HOME).unwrap();
    for event in COMPLETE_JOIN {
        station.post(event).unwrap();
    }
    station.post(DriverEvent::Shutdown).unwrap();

    embassy_futures::block_on(station.run());

    assert_eq!(station.infra().state(), InfraState::Connected);
    assert_eq!(station.roaming().state(), RoamingState::WaitForTrigger);
}

#[test]
fn dump_lists_every_slot() {
    let station = Station::init(Mock::with_aps(), &config(OperationalMode::Auto)).unwrap();
    let slots = station.dump();
    assert_eq!(slots.len(), TRIGGER_SLOT_COUNT);
    assert_eq!(slots[0].owner, SlotOwner::Internal);
    assert_eq!(slots[7].owner, SlotOwner::Free);
}
