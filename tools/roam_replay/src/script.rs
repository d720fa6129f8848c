use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use wlan_roam::{
    conn::{IbssEvent, InfraEvent},
    roaming::ScanStatus,
    triggers::{LinkMetric, RoamingTrigger, TriggerParams, TriggerPayload},
    BssEntry, BssType, DriverEvent, MacAddr,
};

/// One line of a replay script.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    At(u64),
    Bss(BssEntry),
    Connect(MacAddr),
    CreateIbss,
    JoinIbss(MacAddr),
    Disconnect,
    RoamTo(MacAddr),
    ScanNow { full: bool },
    Enable(bool),
    Client { id: u16, params: TriggerParams },
    Post(DriverEvent),
    Dump,
}

pub fn parse_script(text: &str) -> Result<Vec<Command>> {
    let mut out = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let command = parse_line(line).with_context(|| format!("line {}: `{line}`", index + 1))?;
        out.push(command);
    }
    Ok(out)
}

fn parse_line(line: &str) -> Result<Command> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let arg = |n: usize| word_at(&words, n);

    let command = match words[0] {
        "at" => Command::At(parse_num(arg(1)?)?),
        "bss" => Command::Bss(parse_bss(&words[1..])?),
        "connect" => Command::Connect(parse_mac(arg(1)?)?),
        "create-ibss" => Command::CreateIbss,
        "join-ibss" => Command::JoinIbss(parse_mac(arg(1)?)?),
        "disconnect" => Command::Disconnect,
        "roam-to" => Command::RoamTo(parse_mac(arg(1)?)?),
        "scan-now" => Command::ScanNow {
            full: match arg(1)? {
                "full" => true,
                "partial" => false,
                other => bail!("scan-now expects partial|full, got {other}"),
            },
        },
        "enable" => Command::Enable(parse_on_off(arg(1)?)?),
        "client" => Command::Client {
            id: parse_num(arg(1)?)?,
            params: TriggerParams::falling(parse_metric(arg(2)?)?, parse_num(arg(3)?)?),
        },
        "dump" => Command::Dump,
        "infra" => Command::Post(DriverEvent::Infra(parse_infra(arg(1)?)?)),
        "ibss" => Command::Post(DriverEvent::Ibss(parse_ibss(arg(1)?)?)),
        "trigger" => Command::Post(DriverEvent::RoamingTrigger {
            trigger: parse_trigger(arg(1)?)?,
            reason: words.get(2).map(|w| parse_num(w)).transpose()?.unwrap_or(0),
        }),
        "link" => Command::Post(DriverEvent::LinkTrigger {
            slot: parse_num(arg(1)?)?,
            payload: TriggerPayload {
                level: parse_num(arg(2)?)?,
                reason: words.get(3).map(|w| parse_num(w)).transpose()?.unwrap_or(0),
            },
        }),
        "scan" => Command::Post(DriverEvent::ScanComplete(match arg(1)? {
            "ok" => ScanStatus::Ok,
            "fail" => ScanStatus::Failed,
            other => bail!("scan expects ok|fail, got {other}"),
        })),
        "handover-failed" => Command::Post(DriverEvent::HandoverFailed),
        "timeout" => Command::Post(DriverEvent::ConnectTimeout),
        other => bail!("unknown command `{other}`"),
    };
    Ok(command)
}

fn word_at<'a>(words: &[&'a str], n: usize) -> Result<&'a str> {
    words
        .get(n)
        .copied()
        .ok_or_else(|| anyhow!("missing argument {n}"))
}

fn parse_num<T>(word: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    word.parse::<T>()
        .with_context(|| format!("invalid number `{word}`"))
}

pub fn parse_mac(word: &str) -> Result<MacAddr> {
    let mut octets = [0u8; 6];
    let mut parts = word.split(':');
    for octet in &mut octets {
        let part = parts
            .next()
            .ok_or_else(|| anyhow!("mac `{word}` has fewer than 6 octets"))?;
        *octet = u8::from_str_radix(part, 16).with_context(|| format!("bad octet in `{word}`"))?;
    }
    if parts.next().is_some() {
        bail!("mac `{word}` has more than 6 octets");
    }
    Ok(MacAddr::new(octets))
}

fn parse_bss(words: &[&str]) -> Result<BssEntry> {
    let [mac, channel, rssi, flags @ ..] = words else {
        bail!("bss expects <mac> <channel> <rssi> [neighbor] [preauth] [ibss]");
    };
    let mut entry = BssEntry::infrastructure(parse_mac(mac)?, parse_num(channel)?, parse_num(rssi)?);
    for flag in flags {
        match *flag {
            "neighbor" => entry.in_neighbor_list = true,
            "preauth" => entry.pre_authenticated = true,
            "ibss" => entry.bss_type = BssType::Independent,
            other => bail!("unknown bss flag `{other}`"),
        }
    }
    Ok(entry)
}

fn parse_on_off(word: &str) -> Result<bool> {
    match word {
        "on" => Ok(true),
        "off" => Ok(false),
        other => bail!("expected on|off, got {other}"),
    }
}

fn parse_metric(word: &str) -> Result<LinkMetric> {
    match word {
        "rssi" => Ok(LinkMetric::Rssi),
        "snr" => Ok(LinkMetric::Snr),
        other => bail!("expected rssi|snr, got {other}"),
    }
}

fn parse_infra(word: &str) -> Result<InfraEvent> {
    Ok(match word {
        "join-complete" => InfraEvent::JoinComplete,
        "mlme-success" => InfraEvent::MlmeSuccess,
        "rsn-success" => InfraEvent::RsnSuccess,
        "disconnect-complete" => InfraEvent::DisconnectComplete,
        other => bail!("unknown infra event `{other}`"),
    })
}

fn parse_ibss(word: &str) -> Result<IbssEvent> {
    Ok(match word {
        "peer-joined" => IbssEvent::PeerJoined,
        "merge" => IbssEvent::Merge,
        "rsn-success" => IbssEvent::RsnSuccess,
        "disconnect-complete" => IbssEvent::DisconnectComplete,
        other => bail!("unknown ibss event `{other}`"),
    })
}

fn parse_trigger(word: &str) -> Result<RoamingTrigger> {
    RoamingTrigger::ALL
        .into_iter()
        .find(|t| t.name().eq_ignore_ascii_case(word))
        .ok_or_else(|| anyhow!("unknown trigger `{word}`"))
}
