// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain name and server address helpers.

use crate::constants::DNS_PORT;
use crate::errors::{ConfigurationError, Result};
use hickory_proto::rr::Name;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

/// Returns true if `name` ends with an unescaped root label.
#[must_use]
pub fn is_fqdn(name: &str) -> bool {
    let Some(without_dot) = name.strip_suffix('.') else {
        return false;
    };
    // An odd number of backslashes before the final dot escapes it
    let backslashes = without_dot
        .chars()
        .rev()
        .take_while(|c| *c == '\\')
        .count();
    backslashes % 2 == 0
}

/// Appends the root label to `name` unless it is already fully qualified.
///
/// Normalization is idempotent: `fqdn(&fqdn(x)) == fqdn(x)`. The empty string
/// normalizes to the root (`.`).
#[must_use]
pub fn fqdn(name: &str) -> String {
    if is_fqdn(name) {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Parses a name into its wire representation, normalizing it to an FQDN first.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidName`] if the name has empty or
/// oversized labels.
pub fn parse_name(name: &str) -> Result<Name> {
    let normalized = fqdn(name.trim());
    Name::from_str(&normalized).map_err(|e| {
        ConfigurationError::InvalidName {
            name: name.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Candidate zones for `name`, from the name itself up to and including the root.
///
/// `a.b.example.com` yields `a.b.example.com.`, `b.example.com.`,
/// `example.com.`, `com.` and `.`, in that order. Labels follow the DNS
/// presentation format, so an escaped dot (`a\.b`) stays inside its label.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidName`] if `name` is not a valid
/// domain name.
pub fn candidate_zones(name: &str) -> Result<Vec<Name>> {
    let mut candidate = parse_name(name)?;
    let mut candidates = Vec::with_capacity(usize::from(candidate.num_labels()) + 1);

    while !candidate.is_root() {
        let parent = candidate.base_name();
        candidates.push(candidate);
        candidate = parent;
    }
    candidates.push(candidate);
    Ok(candidates)
}

/// Adds the default DNS port to a server address that has none.
///
/// Accepts host names, IPv4 and IPv6 literals, with or without a port
/// (`ns1.example.com`, `10.0.0.1:5353`, `2001:db8::1`, `[2001:db8::1]:53`).
/// Bare IPv6 literals are bracketed.
#[must_use]
pub fn ensure_port_on_server(server: &str) -> String {
    let server = server.trim();

    if server.parse::<SocketAddr>().is_ok() {
        return server.to_string();
    }
    if let Ok(ip) = server.parse::<IpAddr>() {
        return SocketAddr::new(ip, DNS_PORT).to_string();
    }
    if let Some(inner) = server
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return format!("[{inner}]:{DNS_PORT}");
    }
    if let Some((host, port)) = server.rsplit_once(':') {
        if !host.contains(':') && port.parse::<u16>().is_ok() {
            return server.to_string();
        }
    }
    format!("{server}:{DNS_PORT}")
}

/// Splits a normalized `host:port` server string into host and port.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidServer`] if no valid port is present.
pub fn split_host_port(server: &str) -> Result<(String, u16)> {
    let invalid = |reason: &str| ConfigurationError::InvalidServer {
        server: server.to_string(),
        reason: reason.to_string(),
    };

    let (host, port) = server
        .rsplit_once(':')
        .ok_or_else(|| invalid("missing port"))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| invalid("port is not a number between 0 and 65535"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid("missing host").into());
    }
    Ok((host.to_string(), port))
}

/// Checks a server override before it is used.
///
/// Host names, IP literals, `host:port` and `[v6]:port` are accepted. A port
/// part that is not a number between 0 and 65535 is rejected.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidServer`] if the server cannot be
/// turned into `host:port`.
pub fn validate_server(server: &str) -> Result<()> {
    let invalid = |reason: &str| -> crate::errors::DnsUpdateError {
        ConfigurationError::InvalidServer {
            server: server.to_string(),
            reason: reason.to_string(),
        }
        .into()
    };

    let trimmed = server.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty server address"));
    }
    if trimmed.parse::<IpAddr>().is_ok() || trimmed.parse::<SocketAddr>().is_ok() {
        return Ok(());
    }
    if let Some(inner) = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return match inner.parse::<Ipv6Addr>() {
            Ok(_) => Ok(()),
            Err(_) => Err(invalid("bracketed host is not an IPv6 address")),
        };
    }

    let Some((host, port)) = trimmed.rsplit_once(':') else {
        return Ok(());
    };
    if port.parse::<u16>().is_err() {
        return Err(invalid("port is not a number between 0 and 65535"));
    }
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    if host.contains(':') {
        return Err(invalid("host is not a valid address or name"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod names_tests;
