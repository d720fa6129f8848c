use core::fmt;

use heapless::Vec;

use crate::error::RoamError;

/// Signal level in dBm (or dB for SNR values).
pub type Dbm = i16;

/// Largest beacon/probe-response body copied into a roam target.
pub const MAX_FRAME_LEN: usize = 512;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BssType {
    Infrastructure,
    Independent,
}

/// One entry of the scan manager's current BSS list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BssEntry {
    pub bssid: MacAddr,
    pub channel: u8,
    pub rssi_dbm: Dbm,
    pub bss_type: BssType,
    pub in_neighbor_list: bool,
    pub pre_authenticated: bool,
}

impl BssEntry {
    pub const fn infrastructure(bssid: MacAddr, channel: u8, rssi_dbm: Dbm) -> Self {
        Self {
            bssid,
            channel,
            rssi_dbm,
            bss_type: BssType::Infrastructure,
            in_neighbor_list: false,
            pre_authenticated: false,
        }
    }
}

/// Borrowed view of a site-table row. Valid only for the current dispatch step.
#[derive(Clone, Copy, Debug)]
pub struct SiteRecord<'a> {
    pub bssid: MacAddr,
    pub channel: u8,
    pub rssi_dbm: Dbm,
    pub beacon_interval_tu: u16,
    pub capabilities: u16,
    pub frame: &'a [u8],
}

/// Owned copy of the attributes the connection layer needs to join a candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoamTarget {
    pub bssid: MacAddr,
    pub channel: u8,
    pub rssi_dbm: Dbm,
    pub beacon_interval_tu: u16,
    pub capabilities: u16,
    pub frame: Vec<u8, MAX_FRAME_LEN>,
}

impl RoamTarget {
    pub fn from_site(site: &SiteRecord<'_>) -> Result<Self, RoamError> {
        let frame = Vec::from_slice(site.frame).map_err(|_| RoamError::FrameTooLarge {
            len: site.frame.len(),
        })?;
        Ok(Self {
            bssid: site.bssid,
            channel: site.channel,
            rssi_dbm: site.rssi_dbm,
            beacon_interval_tu: site.beacon_interval_tu,
            capabilities: site.capabilities,
            frame,
        })
    }
}
