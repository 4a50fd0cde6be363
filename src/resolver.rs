// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone and authoritative server discovery through SOA queries.
//!
//! [`ZoneResolver::resolve_zone`] climbs from a record name towards the root,
//! sending a recursive SOA query for each suffix, and stops at the first
//! suffix whose SOA is returned in the answer section. That suffix is the
//! zone and the SOA MNAME is its primary server.
//!
//! Queries go to the configured nameserver, or to the first `nameserver` entry
//! of the resolver configuration file.

use crate::constants::{DEFAULT_EXCHANGE_TIMEOUT_SECS, DEFAULT_RESOLV_CONF_PATH, DNS_PORT};
use crate::errors::{rcode_name, ConfigurationError, ResolutionError, Result};
use crate::metrics;
use crate::names::{candidate_zones, ensure_port_on_server, fqdn, parse_name};
use crate::transport;
use crate::types::ZoneInfo;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::SOA;
use hickory_proto::rr::{Name, RData, RecordType};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Where SOA queries are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Explicit recursive nameserver; takes precedence over `resolv_conf`
    pub nameserver: Option<SocketAddr>,
    /// Resolver configuration file read when no nameserver is set
    pub resolv_conf: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nameserver: None,
            resolv_conf: PathBuf::from(DEFAULT_RESOLV_CONF_PATH),
        }
    }
}

impl ResolverConfig {
    /// Use `nameserver` for every SOA query.
    #[must_use]
    pub fn with_nameserver(mut self, nameserver: SocketAddr) -> Self {
        self.nameserver = Some(nameserver);
        self
    }

    /// Read the nameserver from `path` instead of `/etc/resolv.conf`.
    #[must_use]
    pub fn with_resolv_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolv_conf = path.into();
        self
    }

    /// The nameserver SOA queries are sent to.
    ///
    /// The resolver configuration file is read on every call, so edits to it
    /// are picked up without rebuilding the client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ResolverConfig`] if the file cannot be read
    /// or lists no usable nameserver.
    pub async fn nameserver(&self) -> Result<SocketAddr> {
        if let Some(nameserver) = self.nameserver {
            return Ok(nameserver);
        }
        nameserver_from_resolv_conf(&self.resolv_conf).await
    }
}

/// Read the first nameserver from a resolver configuration file.
///
/// # Errors
///
/// Returns [`ConfigurationError::ResolverConfig`] if the file cannot be read
/// or lists no usable nameserver.
pub async fn nameserver_from_resolv_conf(path: &Path) -> Result<SocketAddr> {
    let unusable = |reason: String| ConfigurationError::ResolverConfig {
        path: path.display().to_string(),
        reason,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| unusable(e.to_string()))?;

    parse_resolv_conf(&content)
        .ok_or_else(|| unusable("no nameserver entry".to_string()).into())
}

/// Parse the first usable `nameserver` entry of resolv.conf content.
///
/// Comment lines (`#`, `;`) are skipped and IPv6 zone identifiers
/// (`fe80::1%eth0`) are dropped. The port is always 53.
#[must_use]
pub fn parse_resolv_conf(content: &str) -> Option<SocketAddr> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("nameserver") => tokens.next(),
                _ => None,
            }
        })
        .find_map(|address| {
            let address = address.split('%').next().unwrap_or(address);
            address
                .parse::<IpAddr>()
                .ok()
                .map(|ip| SocketAddr::new(ip, DNS_PORT))
        })
}

/// Server address (`host:port`) for a SOA record's primary nameserver.
#[must_use]
pub fn soa_server(soa: &SOA) -> String {
    let mname = soa.mname().to_string();
    let host = match mname.trim_end_matches('.') {
        "" => mname.as_str(),
        trimmed => trimmed,
    };
    ensure_port_on_server(host)
}

/// Result of one SOA query.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SoaAnswer {
    Found(SOA),
    Missing(String),
}

/// Discovers zones and their primary servers.
#[derive(Debug, Clone)]
pub struct ZoneResolver {
    config: ResolverConfig,
    timeout: Duration,
}

impl Default for ZoneResolver {
    fn default() -> Self {
        Self::new(
            ResolverConfig::default(),
            Duration::from_secs(DEFAULT_EXCHANGE_TIMEOUT_SECS),
        )
    }
}

impl ZoneResolver {
    /// Resolver sending SOA queries according to `config`, each bounded by `timeout`.
    #[must_use]
    pub fn new(config: ResolverConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    /// The resolver configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Find the zone containing `name` and its primary server.
    ///
    /// Candidates are tried from the full name up to the root; the first one
    /// answering with its own SOA wins.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::ZoneNotFound`] if no candidate answers, a
    /// [`crate::errors::NetworkError`] if the nameserver cannot be reached,
    /// and a configuration error if no nameserver is configured.
    pub async fn resolve_zone(&self, name: &str) -> Result<ZoneInfo> {
        let candidates = candidate_zones(name)?;
        let nameserver = self.config.nameserver().await?;

        for candidate in &candidates {
            match self.query_soa(nameserver, candidate).await? {
                SoaAnswer::Found(soa) => {
                    let server = soa_server(&soa);
                    debug!(
                        "Zone for {} is {} (primary server {})",
                        name, candidate, server
                    );
                    return Ok(ZoneInfo {
                        zone: candidate.to_string(),
                        server,
                    });
                }
                SoaAnswer::Missing(reason) => {
                    debug!("{} is not a zone apex: {}", candidate, reason);
                }
            }
        }

        Err(ResolutionError::ZoneNotFound {
            name: fqdn(name.trim()),
        }
        .into())
    }

    /// Find the primary server of a known zone with a single SOA query.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NoSoaAnswer`] if the zone's SOA cannot be
    /// found, and a network or configuration error as for
    /// [`ZoneResolver::resolve_zone`].
    pub async fn resolve_server(&self, zone: &str) -> Result<String> {
        let zone_name = parse_name(zone)?;
        let nameserver = self.config.nameserver().await?;

        match self.query_soa(nameserver, &zone_name).await? {
            SoaAnswer::Found(soa) => Ok(soa_server(&soa)),
            SoaAnswer::Missing(reason) => Err(ResolutionError::NoSoaAnswer {
                zone: zone_name.to_string(),
                resolver: nameserver.to_string(),
                reason,
            }
            .into()),
        }
    }

    async fn query_soa(&self, nameserver: SocketAddr, candidate: &Name) -> Result<SoaAnswer> {
        let server = nameserver.to_string();
        let response =
            match transport::exchange(&server, soa_query(candidate), None, self.timeout).await {
                Ok(response) => response,
                Err(e) => {
                    metrics::record_soa_query("error");
                    return Err(e);
                }
            };

        let answer = match response.response_code() {
            ResponseCode::NoError => response
                .answers()
                .iter()
                .filter(|record| record.name() == candidate)
                .find_map(|record| match record.data() {
                    Some(RData::SOA(soa)) => Some(soa.clone()),
                    _ => None,
                })
                .map_or_else(
                    || SoaAnswer::Missing("no SOA record in answer section".to_string()),
                    SoaAnswer::Found,
                ),
            code => SoaAnswer::Missing(format!("response code {}", rcode_name(code))),
        };

        metrics::record_soa_query(match answer {
            SoaAnswer::Found(_) => "found",
            SoaAnswer::Missing(_) => "not_found",
        });
        Ok(answer)
    }
}

fn soa_query(zone: &Name) -> Message {
    let mut message = Message::new();
    message
        .set_id(rand::random::<u16>())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    message.add_query(Query::query(zone.clone(), RecordType::SOA));
    message
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
