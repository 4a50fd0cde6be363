// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Data model shared by the resolver, the record-set builder and the update client.

use crate::errors::{ConfigurationError, DnsUpdateError, Result};
use hickory_proto::rr::RecordType as WireRecordType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HMAC algorithm used for TSIG signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TsigAlgorithm {
    /// HMAC-MD5 (`hmac-md5.sig-alg.reg.int`), parsed but cannot sign
    HmacMd5,
    /// HMAC-SHA1, parsed but cannot sign
    HmacSha1,
    /// HMAC-SHA224, parsed but cannot sign
    HmacSha224,
    /// HMAC-SHA256
    #[default]
    HmacSha256,
    /// HMAC-SHA384
    HmacSha384,
    /// HMAC-SHA512
    HmacSha512,
}

impl TsigAlgorithm {
    /// Canonical algorithm name, as written in BIND9 key files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacMd5 => "hmac-md5",
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha224 => "hmac-sha224",
            Self::HmacSha256 => "hmac-sha256",
            Self::HmacSha384 => "hmac-sha384",
            Self::HmacSha512 => "hmac-sha512",
        }
    }
}

impl FromStr for TsigAlgorithm {
    type Err = ConfigurationError;

    /// Parses an algorithm name.
    ///
    /// Accepts the canonical names case-insensitively, with or without the
    /// trailing root label (`hmac-sha256.`), and the legacy
    /// `hmac-md5.sig-alg.reg.int` name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().trim_end_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "hmac-md5" | "hmac-md5.sig-alg.reg.int" => Ok(Self::HmacMd5),
            "hmac-sha1" => Ok(Self::HmacSha1),
            "hmac-sha224" => Ok(Self::HmacSha224),
            "hmac-sha256" => Ok(Self::HmacSha256),
            "hmac-sha384" => Ok(Self::HmacSha384),
            "hmac-sha512" => Ok(Self::HmacSha512),
            _ => Err(ConfigurationError::UnsupportedAlgorithm {
                algorithm: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TsigAlgorithm {
    type Error = ConfigurationError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TsigAlgorithm> for String {
    fn from(value: TsigAlgorithm) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TsigAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TSIG credentials plus the optional server override.
///
/// Field names serialize in camelCase so the structure matches the keys of the
/// secret it is usually read from (`tsigKeyName`, `tsigSecret`, `algorithm`,
/// `server`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// TSIG key name, as configured on the server
    pub tsig_key_name: String,
    /// Shared secret, base64 encoded (raw secrets are accepted as a fallback)
    pub tsig_secret: String,
    /// HMAC algorithm, `hmac-sha256` unless specified
    #[serde(default)]
    pub algorithm: TsigAlgorithm,
    /// Explicit server (`host` or `host:port`); skips SOA-based server discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl Credentials {
    /// Credentials using the default algorithm and no server override.
    #[must_use]
    pub fn new(tsig_key_name: impl Into<String>, tsig_secret: impl Into<String>) -> Self {
        Self {
            tsig_key_name: tsig_key_name.into(),
            tsig_secret: tsig_secret.into(),
            algorithm: TsigAlgorithm::default(),
            server: None,
        }
    }

    /// Sets the TSIG algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: TsigAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the server override.
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Checks that key name and secret are present and that the server
    /// override, when set, can be turned into `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingCredential`] naming the first empty
    /// field, and [`ConfigurationError::InvalidServer`] for a malformed override.
    pub fn validate(&self) -> Result<()> {
        if self.tsig_key_name.trim().is_empty() {
            return Err(ConfigurationError::MissingCredential {
                field: crate::constants::SECRET_KEY_TSIG_KEY_NAME.to_string(),
            }
            .into());
        }
        if self.tsig_secret.trim().is_empty() {
            return Err(ConfigurationError::MissingCredential {
                field: crate::constants::SECRET_KEY_TSIG_SECRET.to_string(),
            }
            .into());
        }
        if let Some(server) = &self.server {
            crate::names::validate_server(server)?;
        }
        Ok(())
    }
}

// The secret must never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tsig_key_name", &self.tsig_key_name)
            .field("tsig_secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("server", &self.server)
            .finish()
    }
}

/// Record types this client can create and delete.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    TXT,
}

impl RecordType {
    /// Type mnemonic (`A`, `AAAA`, `CNAME`, `TXT`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::CNAME => "CNAME",
            Self::TXT => "TXT",
        }
    }

    /// The matching hickory wire type.
    #[must_use]
    pub fn wire_type(&self) -> WireRecordType {
        match self {
            Self::A => WireRecordType::A,
            Self::AAAA => WireRecordType::AAAA,
            Self::CNAME => WireRecordType::CNAME,
            Self::TXT => WireRecordType::TXT,
        }
    }
}

impl FromStr for RecordType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::AAAA),
            "CNAME" => Ok(Self::CNAME),
            "TXT" => Ok(Self::TXT),
            _ => Err(ConfigurationError::UnsupportedRecordType {
                record_type: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for RecordType {
    type Error = ConfigurationError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<WireRecordType> for RecordType {
    type Error = ConfigurationError;

    fn try_from(value: WireRecordType) -> std::result::Result<Self, Self::Error> {
        match value {
            WireRecordType::A => Ok(Self::A),
            WireRecordType::AAAA => Ok(Self::AAAA),
            WireRecordType::CNAME => Ok(Self::CNAME),
            WireRecordType::TXT => Ok(Self::TXT),
            other => Err(ConfigurationError::UnsupportedRecordType {
                record_type: other.to_string(),
            }),
        }
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to create, replace, or delete one record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    /// Zone hint; discovered by SOA climbing when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Record owner name (a trailing dot is added when missing)
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Record values, in order
    pub values: Vec<String>,
    /// Time to live in seconds; ignored by deletes
    #[serde(default)]
    pub ttl: u32,
}

impl RecordRequest {
    /// Request without a zone hint.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        record_type: RecordType,
        values: Vec<String>,
        ttl: u32,
    ) -> Self {
        Self {
            zone: None,
            name: name.into(),
            record_type,
            values,
            ttl,
        }
    }

    /// Sets the zone hint.
    #[must_use]
    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// The zone hint, treating an empty string as absent.
    #[must_use]
    pub fn zone_hint(&self) -> Option<&str> {
        self.zone
            .as_deref()
            .map(str::trim)
            .filter(|zone| !zone.is_empty())
    }
}

/// Zone and authoritative server used for an update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneInfo {
    /// Zone name (FQDN)
    pub zone: String,
    /// Authoritative server (`host:port`)
    pub server: String,
}

/// Kind of dynamic update performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperation {
    /// Replace the record set with the requested values
    Upsert,
    /// Remove exactly the requested values from the record set
    Delete,
}

impl UpdateOperation {
    /// Label used in logs, errors and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for UpdateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an update: the zone and server used, or a classified error.
pub type UpdateOutcome = std::result::Result<ZoneInfo, DnsUpdateError>;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
