// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for dynamic DNS updates.
//!
//! Errors are grouped by the class of failure so that callers can decide what to
//! do without inspecting messages:
//! - [`ConfigurationError`] - bad credentials, record data, or local configuration
//! - [`ResolutionError`] - no authoritative zone or server could be discovered
//! - [`NetworkError`] - the exchange with a server failed or timed out
//! - [`ProtocolError`] - the server answered, but not with success
//!
//! [`DnsUpdateError`] composes the four classes and is returned by every public
//! operation of this crate. None of these components retry internally; use
//! [`DnsUpdateError::is_transient`] to drive the caller's own retry policy.

use hickory_proto::op::ResponseCode;
use thiserror::Error;

/// Result type used by every fallible operation in this crate.
pub type Result<T, E = DnsUpdateError> = std::result::Result<T, E>;

/// Errors caused by invalid input or local configuration.
///
/// These are never retriable: the caller must fix the credentials, the record
/// request, or the client configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigurationError {
    /// A required credential field is absent or empty
    #[error("Missing required TSIG credential '{field}'")]
    MissingCredential {
        /// Name of the missing field (e.g., `tsigKeyName`)
        field: String,
    },

    /// The TSIG algorithm is unknown or cannot be used for signing
    #[error("Unsupported TSIG algorithm '{algorithm}'")]
    UnsupportedAlgorithm {
        /// The algorithm as supplied by the caller
        algorithm: String,
    },

    /// The TSIG secret could not be turned into a signing key
    #[error("Invalid TSIG secret for key '{key_name}': {reason}")]
    InvalidSecret {
        /// The TSIG key name the secret belongs to
        key_name: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// Record type outside of A, AAAA, CNAME, TXT
    #[error("Unsupported record type '{record_type}' (supported: A, AAAA, CNAME, TXT)")]
    UnsupportedRecordType {
        /// The requested record type
        record_type: String,
    },

    /// Record values that cannot be encoded for the requested type
    #[error("Invalid {record_type} record data for '{name}': {reason}")]
    InvalidRecordData {
        /// The record owner name
        name: String,
        /// The record type being built
        record_type: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// A zone, record, key, or target name that is not a valid domain name
    #[error("Invalid domain name '{name}': {reason}")]
    InvalidName {
        /// The offending name
        name: String,
        /// Parser error
        reason: String,
    },

    /// A server override that cannot be interpreted as host[:port]
    #[error("Invalid DNS server address '{server}': {reason}")]
    InvalidServer {
        /// The server string as configured
        server: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// The resolver configuration could not be read or names no nameserver
    #[error("Unusable resolver configuration '{path}': {reason}")]
    ResolverConfig {
        /// Path of the resolver configuration file
        path: String,
        /// Explanation of what is wrong
        reason: String,
    },

    /// The credentials secret could not be fetched from the secret store
    #[error("Failed to read TSIG credentials from secret '{secret}': {reason}")]
    SecretLookup {
        /// Namespaced secret reference (`namespace/name`)
        secret: String,
        /// Underlying failure
        reason: String,
    },
}

/// Errors raised while discovering the zone or its authoritative server.
#[derive(Error, Debug, Clone)]
pub enum ResolutionError {
    /// No suffix of the name, up to and including the root, answered a SOA query
    #[error("no authoritative zone found for {name}")]
    ZoneNotFound {
        /// The fully-qualified name that was resolved
        name: String,
    },

    /// The SOA query for a known zone returned no usable answer
    #[error("SOA record for zone '{zone}' could not be found by {resolver}: {reason}")]
    NoSoaAnswer {
        /// The zone that was queried
        zone: String,
        /// The resolver that answered
        resolver: String,
        /// Why the answer was unusable (response code or empty answer)
        reason: String,
    },
}

/// Transport-level failures. These are always retriable.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    /// The server host name could not be resolved to an address
    #[error("Failed to resolve DNS server address {server}: {reason}")]
    AddressResolution {
        /// The server as `host:port`
        server: String,
        /// Underlying failure
        reason: String,
    },

    /// Socket creation, connection, send, or receive failed
    #[error("DNS exchange with {server} failed: {reason}")]
    ConnectionFailed {
        /// The server as `host:port`
        server: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// No response within the configured timeout
    #[error("DNS exchange with {server} timed out after {timeout_ms}ms")]
    Timeout {
        /// The server as `host:port`
        server: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },
}

/// Failures reported by, or detected in the response of, a DNS server.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    /// The server answered the update with a non-success response code
    #[error(
        "DNS update ({operation}) of {record_type} record '{name}' in zone '{zone}' rejected by {server}: {}",
        display_rcode(.code)
    )]
    Rejected {
        /// `upsert` or `delete`
        operation: String,
        /// The zone in the update's zone section
        zone: String,
        /// The record owner name
        name: String,
        /// The record type
        record_type: String,
        /// The server that rejected the update
        server: String,
        /// The response code returned by the server
        code: ResponseCode,
    },

    /// The response carried a TSIG record that did not verify
    #[error("TSIG verification of response from {server} failed for key '{key_name}': {reason}")]
    ResponseVerification {
        /// The server that sent the response
        server: String,
        /// The TSIG key name used for the request
        key_name: String,
        /// Verifier error
        reason: String,
    },

    /// The request message could not be signed or encoded
    #[error("Failed to encode DNS message for {name}: {reason}")]
    MessageEncoding {
        /// The zone or name the message was built for
        name: String,
        /// Encoder or signer error
        reason: String,
    },
}

/// Composite error type returned by every public operation.
#[derive(Error, Debug, Clone)]
pub enum DnsUpdateError {
    /// Invalid input or configuration
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Zone or server discovery failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Transport failure
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Server-side rejection or bad response
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl DnsUpdateError {
    /// Returns true if this error is transient and the operation may be retried.
    ///
    /// Network failures and `SERVFAIL` are transient. Configuration and
    /// resolution failures, authorization failures (`REFUSED`, `NOTAUTH`), TSIG
    /// verification failures, and every other response code are permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::Protocol(ProtocolError::Rejected {
                code: ResponseCode::ServFail,
                ..
            }) => true,

            Self::Configuration(_)
            | Self::Resolution(_)
            | Self::Protocol(
                ProtocolError::Rejected { .. }
                | ProtocolError::ResponseVerification { .. }
                | ProtocolError::MessageEncoding { .. },
            ) => false,
        }
    }

    /// Returns true if the server refused the update on authorization grounds.
    ///
    /// This covers `REFUSED` and `NOTAUTH` responses (wrong key, wrong secret,
    /// or an update policy that does not grant the key) and responses whose
    /// TSIG did not verify.
    #[must_use]
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            Self::Protocol(
                ProtocolError::Rejected {
                    code: ResponseCode::Refused | ResponseCode::NotAuth,
                    ..
                } | ProtocolError::ResponseVerification { .. }
            )
        )
    }

    /// Response code carried by a server rejection, if any.
    #[must_use]
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            Self::Protocol(ProtocolError::Rejected { code, .. }) => Some(*code),
            _ => None,
        }
    }

    /// Returns a CamelCase reason code for this error.
    ///
    /// Intended for callers that reflect the outcome into status conditions
    /// and for the `errors_total` metric.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Configuration(ConfigurationError::MissingCredential { .. }) => {
                "MissingCredential"
            }
            Self::Configuration(ConfigurationError::UnsupportedAlgorithm { .. }) => {
                "UnsupportedAlgorithm"
            }
            Self::Configuration(ConfigurationError::InvalidSecret { .. }) => "InvalidSecret",
            Self::Configuration(ConfigurationError::UnsupportedRecordType { .. }) => {
                "UnsupportedRecordType"
            }
            Self::Configuration(ConfigurationError::InvalidRecordData { .. }) => {
                "InvalidRecordData"
            }
            Self::Configuration(ConfigurationError::InvalidName { .. }) => "InvalidName",
            Self::Configuration(ConfigurationError::InvalidServer { .. }) => "InvalidServer",
            Self::Configuration(ConfigurationError::ResolverConfig { .. }) => {
                "ResolverConfigUnusable"
            }
            Self::Configuration(ConfigurationError::SecretLookup { .. }) => "SecretLookupFailed",

            Self::Resolution(ResolutionError::ZoneNotFound { .. }) => "ZoneNotFound",
            Self::Resolution(ResolutionError::NoSoaAnswer { .. }) => "SoaNotFound",

            Self::Network(NetworkError::AddressResolution { .. }) => "ServerAddressUnresolvable",
            Self::Network(NetworkError::ConnectionFailed { .. }) => "ConnectionFailed",
            Self::Network(NetworkError::Timeout { .. }) => "Timeout",

            Self::Protocol(ProtocolError::Rejected { code, .. }) => match code {
                ResponseCode::Refused => "UpdateRefused",
                ResponseCode::NotAuth => "NotAuthorized",
                ResponseCode::ServFail => "ServerFailure",
                _ => "UpdateRejected",
            },
            Self::Protocol(ProtocolError::ResponseVerification { .. }) => {
                "TsigVerificationFailed"
            }
            Self::Protocol(ProtocolError::MessageEncoding { .. }) => "MessageEncodingFailed",
        }
    }
}

/// Mnemonic for a DNS response code, as written in RFC 1035 / RFC 2136.
///
/// Codes without a mnemonic here are rendered as `RCODE<n>`.
#[must_use]
pub fn rcode_name(code: ResponseCode) -> String {
    let name = match code {
        ResponseCode::NoError => "NOERROR",
        ResponseCode::FormErr => "FORMERR",
        ResponseCode::ServFail => "SERVFAIL",
        ResponseCode::NXDomain => "NXDOMAIN",
        ResponseCode::NotImp => "NOTIMP",
        ResponseCode::Refused => "REFUSED",
        ResponseCode::YXDomain => "YXDOMAIN",
        ResponseCode::YXRRSet => "YXRRSET",
        ResponseCode::NXRRSet => "NXRRSET",
        ResponseCode::NotAuth => "NOTAUTH",
        ResponseCode::NotZone => "NOTZONE",
        other => return format!("RCODE{}", u16::from(other)),
    };
    name.to_string()
}

fn display_rcode(code: &ResponseCode) -> String {
    rcode_name(*code)
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
