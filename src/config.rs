use crate::types::Dbm;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationalMode {
    Manual,
    Auto,
}

#[derive(Clone, Copy, Debug)]
pub struct TriggerThresholds {
    pub data_retry_count: u32,
    pub expected_missed_beacons: u32,
    pub low_rssi_dbm: Dbm,
    pub low_snr_db: Dbm,
    pub bg_scan_low_dbm: Dbm,
    pub bg_scan_normal_dbm: Dbm,
}

#[derive(Clone, Copy, Debug)]
pub struct IbssConfig {
    pub connect_timeout_ms: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct RoamingConfig {
    pub enabled: bool,
    pub mode: OperationalMode,
    pub low_pass_filter_secs: u32,
    pub ap_quality_threshold_dbm: Dbm,
    pub thresholds: TriggerThresholds,
    pub ibss: IbssConfig,
}

impl RoamingConfig {
    pub const fn debounce_window_ms(&self) -> u64 {
        self.low_pass_filter_secs as u64 * 1_000
    }
}

include!(concat!(env!("OUT_DIR"), "/roaming_config.rs"));

pub fn active_config() -> &'static RoamingConfig {
    &ROAMING_CONFIG
}
