//! Replays a scripted sequence of driver events and user commands against the
//! roaming core with recording collaborators, printing everything the core
//! asked of them.

mod script;
mod sim;

use std::{fs, path::PathBuf, process};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use wlan_roam::{gen_sm::SmLabel, OperationalMode, RoamingConfig, Station};

use script::{parse_script, Command};
use sim::SimServices;

#[derive(Parser, Debug)]
#[command(name = "roam_replay", about = "Replay a roaming script against the station core")]
struct Cli {
    /// Script file, one command per line.
    script: PathBuf,

    /// Lines that must appear in the output, in order.
    #[arg(long)]
    expect: Option<PathBuf>,

    /// Override the configured roaming mode.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Auto,
    Manual,
}

impl From<ModeArg> for OperationalMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => Self::Auto,
            ModeArg::Manual => Self::Manual,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let text = fs::read_to_string(&cli.script)
        .with_context(|| format!("failed to read {}", cli.script.display()))?;
    let commands = parse_script(&text)?;

    let mut config = *wlan_roam::active_config();
    if let Some(mode) = cli.mode {
        config.mode = mode.into();
    }

    let output = replay(&commands, &config)?;
    for line in &output {
        println!("{line}");
    }

    if let Some(path) = cli.expect {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        check_expected(&output, &expected_lines(&text))?;
    }
    Ok(())
}

fn replay(commands: &[Command], config: &RoamingConfig) -> Result<Vec<String>> {
    let mut station =
        Station::init(SimServices::default(), config).context("station init failed")?;
    let mut output = station.services_mut().take_log();

    for command in commands {
        log::info!("replay: {:?}", command);
        let result = match command {
            Command::At(ms) => {
                station.services_mut().now_ms = *ms;
                Ok(())
            }
            Command::Bss(entry) => {
                station.services_mut().upsert(*entry);
                Ok(())
            }
            Command::Connect(bssid) => station.connect(*bssid),
            Command::CreateIbss => station.create_ibss(),
            Command::JoinIbss(bssid) => station.join_ibss(*bssid),
            Command::Disconnect => station.disconnect(),
            Command::RoamTo(bssid) => station.roam_to(*bssid),
            Command::ScanNow { full } => station.immediate_scan(*full),
            Command::Enable(enabled) => {
                station.set_roaming_enabled(*enabled);
                Ok(())
            }
            Command::Client { id, params } => station
                .register_client_trigger(*id, params)
                .map(|slot| output.push(format!("client {id} slot {slot}"))),
            Command::Post(event) => station.post(*event).map(|()| {
                station.process_pending();
            }),
            Command::Dump => {
                for snapshot in station.dump() {
                    output.push(format!(
                        "slot {} {:?} dispatched={}",
                        snapshot.slot, snapshot.owner, snapshot.dispatched
                    ));
                }
                Ok(())
            }
        };
        output.append(&mut station.services_mut().take_log());
        if let Err(err) = result {
            output.push(format!("rejected: {err}"));
        }
    }

    output.push(format!(
        "state roaming={} infra={} ibss={}",
        station.roaming().state().name(),
        station.infra().state().name(),
        station.ibss().state().name(),
    ));
    Ok(output)
}

fn expected_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

fn check_expected(output: &[String], expected: &[&str]) -> Result<()> {
    let mut remaining = output.iter();
    for want in expected {
        if !remaining.any(|line| line == want) {
            bail!("expected line not found in order: `{want}`");
        }
    }
    Ok(())
}
