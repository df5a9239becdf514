//! Read-only device state queries.
//!
//! These sit outside the transaction engine: plain show commands
//! parsed into typed records. The device's CLI output is the wire
//! format and is treated as fragile - a shape change here means
//! updating the parsers, never the caller-facing types.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::output;
use crate::session::DeviceSession;

/// One entry of the switch interface table.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub is_up: bool,
    pub is_enabled: bool,
    pub description: String,
    /// Speed in megabits, -1 when the device reports none.
    pub speed_mb: i64,
    pub mac_address: String,
    pub mtu: i64,
}

/// One entry of the kernel ARP table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArpEntry {
    pub ip: String,
    pub mac: String,
    pub interface: String,
}

/// Chassis environment, keyed by sensor name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    /// Fan name to "is ok".
    pub fans: BTreeMap<String, bool>,
    pub temperature: BTreeMap<String, TemperatureSensor>,
    /// PSU name to "is ok".
    pub power: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSensor {
    pub celsius: f64,
    pub is_alert: bool,
}

#[derive(Deserialize)]
struct RawInterface {
    linkstate: Option<String>,
    summary: Option<String>,
    speed: Option<String>,
    iface_obj: Option<RawIfaceObj>,
}

#[derive(Deserialize)]
struct RawIfaceObj {
    mac: Option<String>,
    mtu: Option<i64>,
}

#[derive(Deserialize)]
struct RawSensor {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    state: String,
    input: Option<f64>,
}

impl DeviceSession {
    /// Interface table via `net show interface all json`.
    pub async fn interfaces(&mut self) -> Result<BTreeMap<String, Interface>> {
        const COMMAND: &str = "net show interface all json";
        let channel = self.channel_mut()?;
        let value = output::structured(channel, COMMAND).await?;
        parse_interfaces(value).map_err(|_| {
            ConfigError::MalformedOutput {
                command: COMMAND.to_string(),
            }
            .into()
        })
    }

    /// Kernel ARP table via `arp -n`.
    pub async fn arp_table(&mut self) -> Result<Vec<ArpEntry>> {
        let channel = self.channel_mut()?;
        let body = output::text(channel, "arp -n").await?;
        Ok(parse_arp_table(&body))
    }

    /// Chassis sensors via `net show system sensors json`.
    pub async fn environment(&mut self) -> Result<Environment> {
        const COMMAND: &str = "net show system sensors json";
        let channel = self.channel_mut()?;
        let value = output::structured(channel, COMMAND).await?;
        parse_environment(value).map_err(|_| {
            ConfigError::MalformedOutput {
                command: COMMAND.to_string(),
            }
            .into()
        })
    }
}

fn parse_interfaces(value: Value) -> serde_json::Result<BTreeMap<String, Interface>> {
    let raw: BTreeMap<String, RawInterface> = serde_json::from_value(value)?;

    Ok(raw
        .into_iter()
        .map(|(name, iface)| {
            let up = iface.linkstate.as_deref() == Some("UP");
            let obj = iface.iface_obj;
            (
                name,
                Interface {
                    is_up: up,
                    is_enabled: up,
                    description: iface.summary.unwrap_or_default(),
                    speed_mb: speed_mb(iface.speed.as_deref()),
                    mac_address: obj
                        .as_ref()
                        .and_then(|o| o.mac.clone())
                        .unwrap_or_default(),
                    mtu: obj.as_ref().and_then(|o| o.mtu).unwrap_or(-1),
                },
            )
        })
        .collect())
}

/// Interface speed to megabits: `1G` is 1024, `100M` is 100, missing
/// or `N/A` is -1.
fn speed_mb(speed: Option<&str>) -> i64 {
    let Some(speed) = speed else { return -1 };
    if speed == "N/A" || speed.is_empty() {
        return -1;
    }
    if let Some(gigs) = speed.strip_suffix('G') {
        return gigs.parse::<i64>().map(|g| g * 1024).unwrap_or(-1);
    }
    speed[..speed.len() - 1].parse().unwrap_or(-1)
}

fn parse_arp_table(body: &str) -> Vec<ArpEntry> {
    // First line is the column header.
    body.lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let (&ip, rest) = fields.split_first()?;
            let mac = if rest.first()?.contains("incomplete") {
                "00:00:00:00:00:00".to_string()
            } else {
                (*fields.get(2)?).to_string()
            };
            Some(ArpEntry {
                ip: ip.to_string(),
                mac,
                interface: (*fields.last()?).to_string(),
            })
        })
        .collect()
}

fn parse_environment(value: Value) -> serde_json::Result<Environment> {
    let sensors: Vec<RawSensor> = serde_json::from_value(value)?;

    let mut env = Environment::default();
    for sensor in sensors {
        let ok = sensor.state == "OK";
        match sensor.kind.as_str() {
            "temp" => {
                env.temperature.insert(
                    sensor.name,
                    TemperatureSensor {
                        celsius: sensor.input.unwrap_or_default(),
                        is_alert: !ok,
                    },
                );
            }
            "fan" => {
                env.fans.insert(sensor.name, ok);
            }
            "power" => {
                env.power.insert(sensor.name, ok);
            }
            _ => {}
        }
    }
    Ok(env)
}
