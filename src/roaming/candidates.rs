use core::cmp::Ordering;

use heapless::Vec;

use crate::{
    services::BssView,
    types::{BssEntry, BssType, Dbm, MacAddr},
};

pub const MAX_CANDIDATES: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub bssid: MacAddr,
    pub rssi_dbm: Dbm,
}

/// Handover candidates from the latest BSS list, best first within each list.
/// Selection walks `neighbor`, then `pre_auth`, then `regular`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateLists {
    pub neighbor: Vec<Candidate, MAX_CANDIDATES>,
    pub pre_auth: Vec<Candidate, MAX_CANDIDATES>,
    pub regular: Vec<Candidate, MAX_CANDIDATES>,
}

impl CandidateLists {
    pub const fn new() -> Self {
        Self {
            neighbor: Vec::new(),
            pre_auth: Vec::new(),
            regular: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.neighbor.clear();
        self.pre_auth.clear();
        self.regular.clear();
    }

    pub fn len(&self) -> usize {
        self.neighbor.len() + self.pre_auth.len() + self.regular.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn nth(&self, index: usize) -> Option<Candidate> {
        self.neighbor
            .iter()
            .chain(self.pre_auth.iter())
            .chain(self.regular.iter())
            .nth(index)
            .copied()
    }

    pub fn rebuild(&mut self, view: &dyn BssView, quality_threshold_dbm: Dbm) {
        self.clear();
        let current = view.current_bssid();

        for entry in view.bss_list() {
            if !eligible(entry, current, quality_threshold_dbm) {
                continue;
            }
            let list = if entry.in_neighbor_list {
                &mut self.neighbor
            } else if entry.pre_authenticated {
                &mut self.pre_auth
            } else {
                &mut self.regular
            };
            insert_bounded(
                list,
                Candidate {
                    bssid: entry.bssid,
                    rssi_dbm: entry.rssi_dbm,
                },
            );
        }

        for list in [&mut self.neighbor, &mut self.pre_auth, &mut self.regular] {
            list.sort_unstable_by(strongest_first);
        }
        debug!(
            "candidates rebuilt: neighbor={} pre_auth={} regular={}",
            self.neighbor.len(),
            self.pre_auth.len(),
            self.regular.len()
        );
    }
}

fn eligible(entry: &BssEntry, current: Option<MacAddr>, threshold: Dbm) -> bool {
    entry.bss_type == BssType::Infrastructure
        && Some(entry.bssid) != current
        && entry.rssi_dbm >= threshold
}

/// Keeps the strongest entries once the list is full.
fn insert_bounded(list: &mut Vec<Candidate, MAX_CANDIDATES>, candidate: Candidate) {
    let Err(candidate) = list.push(candidate) else {
        return;
    };
    let weakest = list
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| strongest_first(b, a))
        .map(|(index, _)| index);
    if let Some(index) = weakest {
        if strongest_first(&candidate, &list[index]) == Ordering::Less {
            list[index] = candidate;
        }
    }
}

fn strongest_first(a: &Candidate, b: &Candidate) -> Ordering {
    b.rssi_dbm
        .cmp(&a.rssi_dbm)
        .then_with(|| a.bssid.cmp(&b.bssid))
}
