// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TSIG-signed RFC 2136 update client.
//!
//! [`UpdateClient`] replaces or withdraws one record set per call:
//!
//! - [`UpdateClient::create_or_update`] sends a "delete RRset" instruction
//!   (class ANY) followed by an "add RR" instruction (class IN) for every
//!   value, so the record set ends up holding exactly the requested values.
//! - [`UpdateClient::delete`] sends a "delete RR" instruction (class NONE) for
//!   every value, leaving other records of the same set in place.
//!
//! Every message is signed with the configured TSIG key. The target server is
//! the explicit override from the credentials when set, otherwise the primary
//! server (SOA MNAME) of the zone.
//!
//! # Example
//!
//! ```rust,no_run
//! use rfc2136::{Credentials, RecordRequest, RecordType, UpdateClient};
//!
//! # async fn run() -> rfc2136::Result<()> {
//! let client = UpdateClient::new(Credentials::new("ddns-key.example.com", "c2VjcmV0"))?;
//! let request = RecordRequest::new("www.example.com", RecordType::A, vec!["192.0.2.10".into()], 300)
//!     .in_zone("example.com");
//! let zone = client.create_or_update(&request).await?;
//! println!("updated {} via {}", zone.zone, zone.server);
//! # Ok(())
//! # }
//! ```

use crate::constants::DEFAULT_EXCHANGE_TIMEOUT_SECS;
use crate::errors::{rcode_name, ProtocolError, Result};
use crate::metrics;
use crate::names::{ensure_port_on_server, fqdn, parse_name};
use crate::records::{build_record_set, ResourceRecordSet};
use crate::resolver::{ResolverConfig, ZoneResolver};
use crate::transport;
use crate::tsig::{carries_tsig, UpdateSigner};
use crate::types::{Credentials, RecordRequest, UpdateOperation, UpdateOutcome, ZoneInfo};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Record, RecordType as WireRecordType};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Static configuration of an [`UpdateClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// TSIG key and optional server override
    pub credentials: Credentials,
    /// Where SOA queries for zone discovery are sent
    pub resolver: ResolverConfig,
    /// Bound on each network exchange (SOA query or update)
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration with the default resolver and timeout.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            resolver: ResolverConfig::default(),
            timeout: Duration::from_secs(DEFAULT_EXCHANGE_TIMEOUT_SECS),
        }
    }
}

/// Client for TSIG-signed dynamic updates.
///
/// Cheap to clone; clones share the signer and can be used from concurrent
/// tasks. The client holds no state between calls.
#[derive(Clone)]
pub struct UpdateClient {
    config: ClientConfig,
    signer: Arc<UpdateSigner>,
    resolver: ZoneResolver,
}

impl fmt::Debug for UpdateClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UpdateClient {
    /// Create a client with the default resolver configuration and timeout.
    ///
    /// # Errors
    ///
    /// Fails without any network I/O if the key name or secret is empty, the
    /// key name is not a domain name, or the algorithm cannot sign.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::from_config(ClientConfig::new(credentials))
    }

    /// Create a client from a full configuration.
    ///
    /// # Errors
    ///
    /// See [`UpdateClient::new`].
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let signer = UpdateSigner::from_credentials(&config.credentials)?;
        let resolver = ZoneResolver::new(config.resolver.clone(), config.timeout);
        Ok(Self {
            config,
            signer: Arc::new(signer),
            resolver,
        })
    }

    /// Send SOA queries according to `resolver`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.config.resolver = resolver;
        self.resolver = ZoneResolver::new(self.config.resolver.clone(), self.config.timeout);
        self
    }

    /// Bound every network exchange by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self.resolver = ZoneResolver::new(self.config.resolver.clone(), timeout);
        self
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace the record set named by `request` with the requested values.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid record data (before any
    /// network I/O), a resolution error if the zone or server cannot be
    /// discovered, a network error if the server cannot be reached, and
    /// [`ProtocolError::Rejected`] if the server answers with anything other
    /// than `NOERROR`.
    pub async fn create_or_update(&self, request: &RecordRequest) -> UpdateOutcome {
        self.execute(UpdateOperation::Upsert, request).await
    }

    /// Remove exactly the requested values from the record set.
    ///
    /// The request TTL is ignored. Removing values that do not exist succeeds.
    ///
    /// # Errors
    ///
    /// See [`UpdateClient::create_or_update`].
    pub async fn delete(&self, request: &RecordRequest) -> UpdateOutcome {
        self.execute(UpdateOperation::Delete, request).await
    }

    /// Find the zone containing `name` and the server updates are sent to.
    ///
    /// The server is the explicit override when configured, otherwise the
    /// zone's SOA MNAME.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::ResolutionError::ZoneNotFound`] if no suffix of
    /// `name` answers a SOA query.
    pub async fn resolve_zone(&self, name: &str) -> Result<ZoneInfo> {
        let mut info = self.resolver.resolve_zone(name).await?;
        if let Some(server) = self.server_override() {
            info.server = server;
        }
        Ok(info)
    }

    /// The server updates for `zone` are sent to.
    ///
    /// Returns the explicit override (with port 53 added when missing) without
    /// any query, otherwise the MNAME from a single SOA query for `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::ResolutionError::NoSoaAnswer`] if the zone's
    /// SOA cannot be found.
    pub async fn resolve_server(&self, zone: &str) -> Result<String> {
        if let Some(server) = self.server_override() {
            debug!("Using configured server {} for zone {}", server, zone);
            return Ok(server);
        }
        self.resolver.resolve_server(zone).await
    }

    fn server_override(&self) -> Option<String> {
        self.config
            .credentials
            .server
            .as_deref()
            .map(str::trim)
            .filter(|server| !server.is_empty())
            .map(ensure_port_on_server)
    }

    async fn locate(&self, request: &RecordRequest) -> Result<ZoneInfo> {
        match request.zone_hint() {
            Some(zone) => {
                let zone = fqdn(zone);
                let server = self.resolve_server(&zone).await?;
                Ok(ZoneInfo { zone, server })
            }
            None => self.resolve_zone(&request.name).await,
        }
    }

    async fn execute(&self, operation: UpdateOperation, request: &RecordRequest) -> UpdateOutcome {
        let started = Instant::now();
        let outcome = self.execute_inner(operation, request).await;

        match &outcome {
            Ok(_) => metrics::record_update_success(operation.as_str(), started.elapsed()),
            Err(e) => {
                metrics::record_update_error(operation.as_str(), e.status_reason(), started.elapsed());
            }
        }
        outcome
    }

    async fn execute_inner(
        &self,
        operation: UpdateOperation,
        request: &RecordRequest,
    ) -> UpdateOutcome {
        let ttl = match operation {
            UpdateOperation::Upsert => request.ttl,
            UpdateOperation::Delete => 0,
        };
        let rrset = build_record_set(&request.name, request.record_type, &request.values, ttl)?;

        let zone_info = self.locate(request).await?;
        let message = build_update_message(operation, &zone_info.zone, &rrset)?;

        info!(
            "Sending {} of {} record {} in zone {} to {}: [{}] (TTL: {})",
            operation,
            rrset.record_type,
            rrset.name,
            zone_info.zone,
            zone_info.server,
            rrset.values_display(),
            ttl
        );

        self.send_update(operation, &zone_info, &rrset, message)
            .await?;

        info!(
            "Successfully applied {} of {} record {} in zone {}",
            operation, rrset.record_type, rrset.name, zone_info.zone
        );
        Ok(zone_info)
    }

    async fn send_update(
        &self,
        operation: UpdateOperation,
        zone_info: &ZoneInfo,
        rrset: &ResourceRecordSet,
        message: Message,
    ) -> Result<()> {
        let response = transport::exchange(
            &zone_info.server,
            message,
            Some(self.signer.clone()),
            self.config.timeout,
        )
        .await?;

        let code = response.response_code();
        if code != ResponseCode::NoError {
            error!(
                "DNS UPDATE ({}) rejected by {} for {} record {} with response code: {}",
                operation,
                zone_info.server,
                rrset.record_type,
                rrset.name,
                rcode_name(code)
            );
            return Err(ProtocolError::Rejected {
                operation: operation.to_string(),
                zone: zone_info.zone.clone(),
                name: rrset.name.to_string(),
                record_type: rrset.record_type.to_string(),
                server: zone_info.server.clone(),
                code,
            }
            .into());
        }

        if carries_tsig(&response) {
            debug!("Verified TSIG on response from {}", zone_info.server);
        }
        Ok(())
    }
}

/// Build the unsigned dynamic update message for `rrset` in `zone`.
///
/// The zone section holds `zone SOA IN`. For [`UpdateOperation::Upsert`] the
/// update section holds a class ANY "delete RRset" record followed by every
/// record of the set; for [`UpdateOperation::Delete`] it holds every record of
/// the set as a class NONE, TTL 0 "delete RR" record.
///
/// # Errors
///
/// Returns [`crate::errors::ConfigurationError::InvalidName`] if `zone` is
/// not a valid domain name.
pub fn build_update_message(
    operation: UpdateOperation,
    zone: &str,
    rrset: &ResourceRecordSet,
) -> Result<Message> {
    let zone_name = parse_name(zone)?;

    let mut zone_query = Query::query(zone_name, WireRecordType::SOA);
    zone_query.set_query_class(DNSClass::IN);

    let mut message = Message::new();
    message
        .set_id(rand::random::<u16>())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Update)
        .set_recursion_desired(false);
    message.add_query(zone_query);

    match operation {
        UpdateOperation::Upsert => {
            let mut delete_rrset = Record::with(rrset.name.clone(), rrset.record_type.wire_type(), 0);
            delete_rrset.set_dns_class(DNSClass::ANY);
            message.add_name_server(delete_rrset);
            message.add_name_servers(rrset.records.iter().cloned());
        }
        UpdateOperation::Delete => {
            message.add_name_servers(rrset.records.iter().cloned().map(|mut record| {
                record.set_dns_class(DNSClass::NONE);
                record.set_ttl(0);
                record
            }));
        }
    }

    Ok(message)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
