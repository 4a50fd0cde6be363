// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # rfc2136 - TSIG-signed dynamic DNS updates
//!
//! Create, replace and delete A, AAAA, CNAME and TXT records on an
//! authoritative DNS server (BIND9 or any RFC 2136 implementation) using
//! TSIG-authenticated dynamic updates.
//!
//! ## Overview
//!
//! - The zone of a record is discovered by climbing its name towards the root
//!   with SOA queries; the zone's SOA MNAME is the server updates go to,
//!   unless the credentials name an explicit server.
//! - Upserts replace the whole record set in one atomic update; deletes remove
//!   only the requested values.
//! - Every failure is classified (configuration, resolution, network,
//!   protocol) so callers can decide whether to retry.
//!
//! ## Modules
//!
//! - [`client`] - the update client
//! - [`resolver`] - SOA-based zone and server discovery
//! - [`records`] - record-set construction
//! - [`tsig`] - TSIG signer creation and BIND9 key files
//! - [`credentials`] - credential providers and secret parsing
//! - [`transport`] - UDP/TCP message exchange
//! - [`errors`] - error taxonomy
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use rfc2136::{Credentials, RecordRequest, RecordType, UpdateClient};
//!
//! # async fn run() -> rfc2136::Result<()> {
//! let credentials = Credentials::new("ddns-key.example.com", "c2VjcmV0")
//!     .with_server("ns1.example.com");
//! let client = UpdateClient::new(credentials)?;
//!
//! let txt = RecordRequest::new(
//!     "_acme-challenge.example.com",
//!     RecordType::TXT,
//!     vec!["token".to_string()],
//!     60,
//! );
//! client.create_or_update(&txt).await?;
//! client.delete(&txt).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod constants;
pub mod credentials;
pub mod errors;
pub mod metrics;
pub mod names;
pub mod records;
pub mod resolver;
pub mod transport;
pub mod tsig;
pub mod types;

pub use client::{ClientConfig, UpdateClient};
pub use credentials::{
    CredentialsProvider, SecretCredentialsProvider, SecretReference, StaticCredentialsProvider,
};
pub use errors::{
    ConfigurationError, DnsUpdateError, NetworkError, ProtocolError, ResolutionError, Result,
};
pub use resolver::ResolverConfig;
pub use types::{
    Credentials, RecordRequest, RecordType, TsigAlgorithm, UpdateOperation, UpdateOutcome,
    ZoneInfo,
};
