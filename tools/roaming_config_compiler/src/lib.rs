use std::{fmt, fs, path::Path};

use serde::Deserialize;

const RSSI_MIN_DBM: i32 = -120;
const RSSI_MAX_DBM: i32 = 0;
const SNR_MAX_DB: i32 = 60;

#[derive(Debug)]
pub enum ConfigCompilerError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigCompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "io error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigCompilerError {}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModeSpec {
    Auto,
    Manual,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdSpec {
    pub data_retry_count: u32,
    pub expected_missed_beacons: u32,
    pub low_rssi_dbm: i32,
    pub low_snr_db: i32,
    pub bg_scan_low_dbm: i32,
    pub bg_scan_normal_dbm: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IbssSpec {
    pub connect_timeout_ms: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoamingFile {
    pub enabled: bool,
    pub mode: ModeSpec,
    pub low_pass_filter_secs: u32,
    pub ap_quality_threshold_dbm: i32,
    pub thresholds: ThresholdSpec,
    pub ibss: IbssSpec,
}

pub fn parse_roaming_file(path: &Path) -> Result<RoamingFile, ConfigCompilerError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ConfigCompilerError::Io(format!("{}: {e}", path.display())))?;
    parse_roaming_str(&raw)
}

pub fn parse_roaming_str(raw: &str) -> Result<RoamingFile, ConfigCompilerError> {
    toml::from_str(raw).map_err(|e| ConfigCompilerError::Parse(e.to_string()))
}

fn in_rssi_range(value: i32) -> bool {
    (RSSI_MIN_DBM..=RSSI_MAX_DBM).contains(&value)
}

pub fn validate_config(config: &RoamingFile) -> Result<(), ConfigCompilerError> {
    let fail = |msg: &str| Err(ConfigCompilerError::Validation(msg.to_string()));
    let t = &config.thresholds;

    if config.low_pass_filter_secs == 0 {
        return fail("low_pass_filter_secs must be > 0");
    }
    if !in_rssi_range(config.ap_quality_threshold_dbm) {
        return fail("ap_quality_threshold_dbm must be within [-120, 0]");
    }
    if t.data_retry_count == 0 {
        return fail("thresholds.data_retry_count must be > 0");
    }
    if t.expected_missed_beacons == 0 {
        return fail("thresholds.expected_missed_beacons must be > 0");
    }
    if !in_rssi_range(t.low_rssi_dbm) || !in_rssi_range(t.bg_scan_low_dbm) {
        return fail("thresholds rssi fields must be within [-120, 0]");
    }
    if !in_rssi_range(t.bg_scan_normal_dbm) {
        return fail("thresholds rssi fields must be within [-120, 0]");
    }
    if !(0..=SNR_MAX_DB).contains(&t.low_snr_db) {
        return fail("thresholds.low_snr_db must be within [0, 60]");
    }
    if t.bg_scan_normal_dbm <= t.bg_scan_low_dbm {
        return fail("thresholds.bg_scan_normal_dbm must be > thresholds.bg_scan_low_dbm");
    }
    if config.ibss.connect_timeout_ms == 0 {
        return fail("ibss.connect_timeout_ms must be > 0");
    }
    Ok(())
}

pub fn render_generated_config(config: &RoamingFile) -> String {
    let t = &config.thresholds;
    let mode = match config.mode {
        ModeSpec::Auto => "OperationalMode::Auto",
        ModeSpec::Manual => "OperationalMode::Manual",
    };

    let mut out = String::new();
    out.push_str("// @generated by roaming_config_compiler. Do not edit.\n");
    out.push_str("pub static ROAMING_CONFIG: RoamingConfig = RoamingConfig {\n");
    out.push_str(&format!("    enabled: {},\n", config.enabled));
    out.push_str(&format!("    mode: {mode},\n"));
    out.push_str(&format!(
        "    low_pass_filter_secs: {},\n",
        config.low_pass_filter_secs
    ));
    out.push_str(&format!(
        "    ap_quality_threshold_dbm: {},\n",
        config.ap_quality_threshold_dbm
    ));
    out.push_str("    thresholds: TriggerThresholds {\n");
    out.push_str(&format!("        data_retry_count: {},\n", t.data_retry_count));
    out.push_str(&format!(
        "        expected_missed_beacons: {},\n",
        t.expected_missed_beacons
    ));
    out.push_str(&format!("        low_rssi_dbm: {},\n", t.low_rssi_dbm));
    out.push_str(&format!("        low_snr_db: {},\n", t.low_snr_db));
    out.push_str(&format!("        bg_scan_low_dbm: {},\n", t.bg_scan_low_dbm));
    out.push_str(&format!(
        "        bg_scan_normal_dbm: {},\n",
        t.bg_scan_normal_dbm
    ));
    out.push_str("    },\n");
    out.push_str("    ibss: IbssConfig {\n");
    out.push_str(&format!(
        "        connect_timeout_ms: {},\n",
        config.ibss.connect_timeout_ms
    ));
    out.push_str("    },\n");
    out.push_str("};\n");
    out
}

pub fn generate_from_path(path: &Path) -> Result<String, ConfigCompilerError> {
    let config = parse_roaming_file(path)?;
    validate_config(&config)?;
    Ok(render_generated_config(&config))
}
