// galaxy - CLI for the Galaxy console slot API
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Slot values returned by the console and the tab-separated report.

use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::io::{self, Write};
use std::net::{IpAddr, ToSocketAddrs};

/// One element of the console's JSON array.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SlotRecord {
    pub id: String,
    pub name: String,
    /// Canonical slot URL; the host is taken from here.
    #[serde(rename = "self")]
    pub url: String,
    /// Absent or null on unassigned slots.
    #[serde(default)]
    pub binary: Option<String>,
    #[serde(default)]
    pub config: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    id: String,
    name: String,
    url: String,
    host: String,
    ip: IpAddr,
    binary: String,
    config: String,
    status: String,
}

impl Slot {
    /// Builds a slot, resolving its host through the system resolver.
    pub fn from_record(record: SlotRecord) -> Result<Self> {
        Self::from_record_with(record, resolve_host)
    }

    pub fn from_record_with<F>(record: SlotRecord, resolve: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Result<IpAddr>,
    {
        let host = host_of(&record.url)
            .with_context(|| format!("reading host of slot {}", record.id))?;
        let ip = resolve(&host)?;

        Ok(Self {
            id: record.id,
            name: record.name,
            url: record.url,
            host,
            ip,
            binary: record.binary.unwrap_or_default(),
            config: record.config.unwrap_or_default(),
            status: record.status,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn config(&self) -> &str {
        &self.config
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Report sort key: name and id joined as one string.
    pub fn sort_key(&self) -> String {
        format!("{}{}", self.name, self.id)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.id, self.host, self.ip, self.name, self.status, self.binary, self.config
        )
    }
}

fn host_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("parsing slot url `{url}`"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("slot url `{url}` has no host"))?;
    Ok(host.trim_start_matches('[').trim_end_matches(']').to_string())
}

/// First address the resolver returns for `host`.
pub fn resolve_host(host: &str) -> Result<IpAddr> {
    (host, 0)
        .to_socket_addrs()
        .with_context(|| format!("resolving host `{host}`"))?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| anyhow!("host `{host}` resolved to no addresses"))
}

/// Sorts by the concatenated `name + id` string, so "a1"+"0" and "a"+"10"
/// compare equal and keep their console order.
pub fn sort_slots(slots: &mut [Slot]) {
    slots.sort_by_cached_key(Slot::sort_key);
}

pub fn render<W: Write>(writer: &mut W, slots: &mut [Slot]) -> io::Result<()> {
    sort_slots(slots);
    for slot in slots.iter() {
        writeln!(writer, "{slot}")?;
    }
    Ok(())
}
