//! The single cooperative execution context. Firmware events, scan
//! completions and timer expiries are queued here and dispatched one at a time
//! in arrival order through the trigger registry, the roaming engine and the
//! connection machines.

#[cfg(test)]
mod tests;

use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};

use crate::{
    config::RoamingConfig,
    conn::{
        ConnAction, ConnActions, IbssConnection, IbssEvent, InfraConnection, InfraEvent,
        SmeReport,
    },
    error::RoamError,
    gen_sm::SmLabel,
    roaming::{ConnectionStatus, RoamingAction, RoamingEngine, RoamingOutput, ScanStatus},
    services::{EventSink, StationServices, UpwardEvent},
    triggers::{
        ClientId, LinkMetric, RoamingTrigger, SlotSnapshot, TriggerBinding, TriggerParams,
        TriggerPayload, TriggerRegistry, TRIGGER_SLOT_COUNT,
    },
    types::{MacAddr, RoamTarget},
};

pub const QUEUE_DEPTH: usize = 16;

pub const LOW_RSSI_SLOT: u8 = 0;
pub const LOW_SNR_SLOT: u8 = 1;
pub const BG_SCAN_LOW_SLOT: u8 = 2;
pub const BG_SCAN_NORMAL_SLOT: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverEvent {
    /// Raw comparator event from a firmware trigger slot.
    LinkTrigger { slot: u8, payload: TriggerPayload },
    /// Already-classified trigger (BSS loss, TX retries, AP disconnect, ...).
    RoamingTrigger { trigger: RoamingTrigger, reason: u16 },
    ScanComplete(ScanStatus),
    /// Link completions only. Connect, create, handover and disconnect go
    /// through the [`Station`] methods.
    Infra(InfraEvent),
    Ibss(IbssEvent),
    HandoverFailed,
    ConnectTimeout,
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    None,
    Infrastructure,
    Independent,
}

/// Everything the registry's internal handlers may touch.
pub struct Link<S> {
    services: S,
    roaming: RoamingEngine,
    infra: InfraConnection,
    ibss: IbssConnection,
    topology: Topology,
    join_target: Option<RoamTarget>,
    handover_in_progress: bool,
}

impl<S: StationServices> EventSink for Link<S> {
    fn deliver(&mut self, event: UpwardEvent) {
        self.services.deliver(event);
    }
}

pub struct Station<S: StationServices> {
    registry: TriggerRegistry<Link<S>>,
    link: Link<S>,
    queue: Channel<NoopRawMutex, DriverEvent, QUEUE_DEPTH>,
}

impl<S: StationServices> Station<S> {
    pub fn new(services: S, config: &RoamingConfig) -> Self {
        Self {
            registry: TriggerRegistry::new(),
            link: Link {
                services,
                roaming: RoamingEngine::new(config),
                infra: InfraConnection::new(),
                ibss: IbssConnection::new(config.ibss.connect_timeout_ms),
                topology: Topology::None,
                join_target: None,
                handover_in_progress: false,
            },
            queue: Channel::new(),
        }
    }

    /// Builds the station and arms the internal link-quality triggers and the
    /// firmware BSS-loss and TX-retry limits.
    pub fn init(services: S, config: &RoamingConfig) -> Result<Self, RoamError> {
        let mut station = Self::new(services, config);
        let thresholds = &config.thresholds;

        let internal: [(u8, InternalBinding<S>, TriggerParams); 4] = [
            (
                LOW_RSSI_SLOT,
                on_low_rssi::<S>,
                TriggerParams::falling(LinkMetric::Rssi, thresholds.low_rssi_dbm),
            ),
            (
                LOW_SNR_SLOT,
                on_low_snr::<S>,
                TriggerParams::falling(LinkMetric::Snr, thresholds.low_snr_db),
            ),
            (
                BG_SCAN_LOW_SLOT,
                on_bg_scan_low::<S>,
                TriggerParams::falling(LinkMetric::Rssi, thresholds.bg_scan_low_dbm),
            ),
            (
                BG_SCAN_NORMAL_SLOT,
                on_bg_scan_normal::<S>,
                TriggerParams::rising(LinkMetric::Rssi, thresholds.bg_scan_normal_dbm),
            ),
        ];
        for (slot, handler, params) in internal {
            station.registry.register(
                slot,
                TriggerBinding::Internal(handler),
                &params,
                &mut station.link.services,
            )?;
        }

        station
            .link
            .services
            .configure_bss_loss(thresholds.expected_missed_beacons)?;
        station
            .link
            .services
            .configure_tx_retry(thresholds.data_retry_count)?;

        info!(
            "station: {} mode, roaming enabled={}, {} trigger slots",
            station.link.roaming.mode().name(),
            config.enabled,
            TRIGGER_SLOT_COUNT
        );
        Ok(station)
    }

    pub fn post(&self, event: DriverEvent) -> Result<(), RoamError> {
        self.queue.try_send(event).map_err(|_| {
            error!("station: queue full, dropping {:?}", event);
            RoamError::QueueFull
        })
    }

    /// Drains the queue synchronously. Stops at `Shutdown`.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.queue.try_receive() {
            if event == DriverEvent::Shutdown {
                break;
            }
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Event loop for an executor task. Returns after `Shutdown`.
    pub async fn run(&mut self) {
        loop {
            let event = self.queue.receive().await;
            if event == DriverEvent::Shutdown {
                info!("station: shutdown");
                return;
            }
            self.handle(event);
        }
    }

    pub fn handle(&mut self, event: DriverEvent) {
        trace!("station: {:?}", event);
        match event {
            DriverEvent::LinkTrigger { slot, payload } => {
                if let Err(err) = self.registry.dispatch(slot, &payload, &mut self.link) {
                    warn!("station: link trigger dropped: {}", err);
                }
            }
            DriverEvent::RoamingTrigger { trigger, reason } => self.link.raise(trigger, reason),
            DriverEvent::ScanComplete(status) => self.link.scan_complete(status),
            DriverEvent::Infra(event) if event.is_completion() => self.link.fire_infra(event),
            DriverEvent::Ibss(event) if event.is_completion() => self.link.fire_ibss(event),
            DriverEvent::Infra(event) => {
                warn!("station: queued infra {} refused", event.name())
            }
            DriverEvent::Ibss(event) => warn!("station: queued ibss {} refused", event.name()),
            DriverEvent::HandoverFailed => self.link.handover_failed(),
            DriverEvent::ConnectTimeout => self.link.connect_timeout(),
            DriverEvent::Shutdown => {}
        }
    }

    pub fn register_client_trigger(
        &mut self,
        client_id: ClientId,
        params: &TriggerParams,
    ) -> Result<u8, RoamError> {
        self.registry.register(
            0,
            TriggerBinding::External(client_id),
            params,
            &mut self.link.services,
        )
    }

    pub fn unregister_client_trigger(&mut self, client_id: ClientId) -> Result<u8, RoamError> {
        self.registry
            .unregister_client(client_id, &mut self.link.services)
    }

    pub fn connect(&mut self, bssid: MacAddr) -> Result<(), RoamError> {
        self.link.ensure_idle()?;
        let target = self.link.resolve(bssid)?;
        info!("station: connecting to {}", bssid);
        self.link.join_target = Some(target);
        self.link.topology = Topology::Infrastructure;
        self.link.fire_infra(InfraEvent::Connect);
        Ok(())
    }

    pub fn create_ibss(&mut self) -> Result<(), RoamError> {
        self.link.ensure_idle()?;
        self.link.join_target = None;
        self.link.topology = Topology::Independent;
        self.link.fire_ibss(IbssEvent::Create);
        Ok(())
    }

    pub fn join_ibss(&mut self, bssid: MacAddr) -> Result<(), RoamError> {
        self.link.ensure_idle()?;
        let target = self.link.resolve(bssid)?;
        self.link.join_target = Some(target);
        self.link.topology = Topology::Independent;
        self.link.fire_ibss(IbssEvent::Connect);
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<(), RoamError> {
        match self.link.topology {
            Topology::None => Err(RoamError::NotConnected),
            Topology::Infrastructure => {
                self.link.roaming_status(ConnectionStatus::NotConnected);
                self.link.fire_infra(InfraEvent::Disconnect);
                Ok(())
            }
            Topology::Independent => {
                self.link.fire_ibss(IbssEvent::Disconnect);
                Ok(())
            }
        }
    }

    pub fn roam_to(&mut self, bssid: MacAddr) -> Result<(), RoamError> {
        let out = self.link.roaming.roam_to(bssid, &self.link.services)?;
        self.link.apply_roaming(out);
        Ok(())
    }

    pub fn immediate_scan(&mut self, full: bool) -> Result<(), RoamError> {
        let out = self.link.roaming.immediate_scan(full, &self.link.services)?;
        self.link.apply_roaming(out);
        Ok(())
    }

    pub fn set_roaming_enabled(&mut self, enabled: bool) {
        self.link.roaming.set_enabled(enabled);
    }

    pub fn dump(&self) -> heapless::Vec<SlotSnapshot, TRIGGER_SLOT_COUNT> {
        self.link.roaming.dump();
        self.link.infra.machine().dump();
        self.link.ibss.machine().dump();
        self.registry.dump()
    }

    pub fn roaming(&self) -> &RoamingEngine {
        &self.link.roaming
    }

    pub fn infra(&self) -> &InfraConnection {
        &self.link.infra
    }

    pub fn ibss(&self) -> &IbssConnection {
        &self.link.ibss
    }

    pub fn registry(&self) -> &TriggerRegistry<Link<S>> {
        &self.registry
    }

    pub fn topology(&self) -> Topology {
        self.link.topology
    }

    pub fn services(&self) -> &S {
        &self.link.services
    }

    pub fn services_mut(&mut self) -> &mut S {
        &mut self.link.services
    }
}

type InternalBinding<S> = fn(&mut Link<S>, &TriggerPayload);

fn on_low_rssi<S: StationServices>(link: &mut Link<S>, payload: &TriggerPayload) {
    link.raise(RoamingTrigger::LowQuality, payload.reason);
}

fn on_low_snr<S: StationServices>(link: &mut Link<S>, payload: &TriggerPayload) {
    link.raise(RoamingTrigger::LowSnr, payload.reason);
}

fn on_bg_scan_low<S: StationServices>(link: &mut Link<S>, payload: &TriggerPayload) {
    link.raise(RoamingTrigger::LowQualityForBgScan, payload.reason);
}

fn on_bg_scan_normal<S: StationServices>(link: &mut Link<S>, payload: &TriggerPayload) {
    link.raise(RoamingTrigger::NormalQualityForBgScan, payload.reason);
}

impl<S: StationServices> Link<S> {
    fn ensure_idle(&self) -> Result<(), RoamError> {
        if self.topology != Topology::None {
            warn!("station: link busy ({:?})", self.topology);
            return Err(RoamError::Busy);
        }
        Ok(())
    }

    fn resolve(&self, bssid: MacAddr) -> Result<RoamTarget, RoamError> {
        let site = self
            .services
            .site(&bssid)
            .ok_or(RoamError::UnknownBss(bssid))?;
        RoamTarget::from_site(&site)
    }

    fn raise(&mut self, trigger: RoamingTrigger, reason: u16) {
        let now_ms = self.services.now_ms();
        let out = self
            .roaming
            .on_trigger(trigger, reason, now_ms, &self.services);
        self.apply_roaming(out);
    }

    fn scan_complete(&mut self, status: ScanStatus) {
        let out = self.roaming.on_scan_complete(status, &self.services);
        self.apply_roaming(out);
    }

    fn roaming_status(&mut self, status: ConnectionStatus) {
        let out = self.roaming.on_connection_status(status, &self.services);
        self.apply_roaming(out);
    }

    fn handover_failed(&mut self) {
        if !self.handover_in_progress {
            warn!("station: handover failure without handover");
            return;
        }
        self.roaming_status(ConnectionStatus::HandoverFailure);
    }

    fn connect_timeout(&mut self) {
        if let Some(out) = self.ibss.on_connect_timeout() {
            self.services.deliver(UpwardEvent::ConnectTimeout);
            self.apply_conn(&out.actions, Topology::Independent);
        }
    }

    fn fire_infra(&mut self, event: InfraEvent) {
        let out = self.infra.fire(event);
        self.apply_conn(&out.actions, Topology::Infrastructure);
    }

    fn fire_ibss(&mut self, event: IbssEvent) {
        let out = self.ibss.fire(event);
        self.apply_conn(&out.actions, Topology::Independent);
    }

    fn apply_roaming(&mut self, out: RoamingOutput) {
        if out.actions.dropped() > 0 {
            error!("station: {} roaming actions lost", out.actions.dropped());
        }
        for action in out.actions.iter() {
            match *action {
                RoamingAction::RequestScan(scan_type) => self.services.request_scan(scan_type),
                RoamingAction::AbortScan => self.services.abort_scan(),
                RoamingAction::QualityHint { low } => self.services.set_quality_hint(low),
                RoamingAction::ConnectToTarget => {
                    let Some(target) = self.roaming.target().cloned() else {
                        error!("station: handover requested without target");
                        continue;
                    };
                    info!("station: handover to {}", target.bssid);
                    self.join_target = Some(target);
                    self.handover_in_progress = true;
                    self.fire_infra(InfraEvent::Handover);
                }
                RoamingAction::ReportTrigger(trigger) => {
                    self.services.deliver(UpwardEvent::RoamingTrigger(trigger))
                }
                RoamingAction::ReportScanResults { candidates } => self
                    .services
                    .deliver(UpwardEvent::ScanResults { candidates }),
                RoamingAction::ReportRoamSuccess { bssid } => {
                    self.services.deliver(UpwardEvent::RoamSucceeded { bssid })
                }
                RoamingAction::ReportRoamFailure {
                    trigger,
                    disconnect,
                } => {
                    self.services.deliver(UpwardEvent::RoamFailed { trigger });
                    let torn_down = core::mem::take(&mut self.handover_in_progress);
                    if disconnect || torn_down {
                        info!("station: roam failed for {}, disconnecting", trigger.name());
                        self.roaming_status(ConnectionStatus::NotConnected);
                        self.fire_infra(InfraEvent::Disconnect);
                    }
                }
            }
        }
    }

    fn apply_conn(&mut self, actions: &ConnActions, source: Topology) {
        for action in actions.iter() {
            match *action {
                ConnAction::Join(kind) => self.services.join(kind, self.join_target.as_ref()),
                ConnAction::StartMlme => self.services.start_mlme(),
                ConnAction::StartConnectTimer { ms } => self.services.start_connect_timer(ms),
                ConnAction::StopConnectTimer => self.services.stop_connect_timer(),
                ConnAction::NotifyAssociated => self.services.deliver(UpwardEvent::Associated),
                ConnAction::RemoveSelfSite => self.services.remove_self_site(),
                ConnAction::SetPort(status) => self.services.set_port(status),
                ConnAction::DisconnectFirmware => self.services.disconnect_firmware(),
                ConnAction::StartRsn => self.services.start_rsn(),
                ConnAction::StopRsn => self.services.stop_rsn(),
                ConnAction::StartTrafficMonitor => self.services.start_traffic_monitor(),
                ConnAction::StopTrafficMonitor => self.services.stop_traffic_monitor(),
                ConnAction::SetHealth { connected } => {
                    self.services.set_health_connected(connected)
                }
                ConnAction::ReportToSme(SmeReport::Connected) => self.report_connected(source),
                ConnAction::ReportToSme(SmeReport::Disconnected) => {
                    self.report_disconnected(source)
                }
            }
        }
    }

    fn report_connected(&mut self, source: Topology) {
        self.services.deliver(UpwardEvent::Connected);
        if source != Topology::Infrastructure {
            return;
        }
        let status = if core::mem::take(&mut self.handover_in_progress) {
            ConnectionStatus::HandoverSuccess
        } else {
            ConnectionStatus::Connected
        };
        self.roaming_status(status);
    }

    fn report_disconnected(&mut self, source: Topology) {
        self.services.deliver(UpwardEvent::Disconnected);
        if source == Topology::Infrastructure {
            self.handover_in_progress = false;
            self.roaming_status(ConnectionStatus::NotConnected);
        }
        self.topology = Topology::None;
        self.join_target = None;
    }
}
