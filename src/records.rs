// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record-set construction for A, AAAA, CNAME and TXT updates.
//!
//! A request's values are turned into hickory [`Record`]s with the normalized
//! owner name, the requested TTL and class IN. The update client later decides
//! which class each record is sent with (IN to add, NONE to delete).

use crate::errors::{ConfigurationError, Result};
use crate::names::parse_name;
use crate::types::RecordType;
use hickory_proto::rr::{rdata, DNSClass, Name, RData, Record};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use tracing::warn;

/// Longest character-string in a TXT record (RFC 1035 §3.3)
const MAX_TXT_SEGMENT_LEN: usize = 255;

/// The records for one (name, type) pair, ready for an update message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecordSet {
    /// Owner name, fully qualified
    pub name: Name,
    /// Type shared by every record in the set
    pub record_type: RecordType,
    /// TTL shared by every record in the set
    pub ttl: u32,
    /// The records, in request order
    pub records: Vec<Record>,
}

impl ResourceRecordSet {
    /// Number of records in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The payloads, rendered for logs.
    #[must_use]
    pub fn values_display(&self) -> String {
        self.records
            .iter()
            .filter_map(Record::data)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Build the record set for `name`.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidName`] if `name` (or a CNAME target)
/// is not a valid domain name, and [`ConfigurationError::InvalidRecordData`]
/// if `values` is empty or a value does not fit the record type.
pub fn build_record_set(
    name: &str,
    record_type: RecordType,
    values: &[String],
    ttl: u32,
) -> Result<ResourceRecordSet> {
    let owner = parse_name(name)?;

    let invalid = |reason: String| ConfigurationError::InvalidRecordData {
        name: owner.to_string(),
        record_type: record_type.to_string(),
        reason,
    };

    if values.is_empty() {
        return Err(invalid("at least one value is required".to_string()).into());
    }

    let payloads: Vec<RData> = match record_type {
        RecordType::A => values
            .iter()
            .map(|value| {
                Ipv4Addr::from_str(value.trim())
                    .map(|ip| RData::A(ip.into()))
                    .map_err(|_| invalid(format!("'{value}' is not an IPv4 address")))
            })
            .collect::<std::result::Result<_, _>>()?,

        RecordType::AAAA => values
            .iter()
            .map(|value| {
                Ipv6Addr::from_str(value.trim())
                    .map(|ip| RData::AAAA(ip.into()))
                    .map_err(|_| invalid(format!("'{value}' is not an IPv6 address")))
            })
            .collect::<std::result::Result<_, _>>()?,

        RecordType::CNAME => {
            if values.len() > 1 {
                warn!(
                    "CNAME record {} accepts a single target, ignoring {} extra value(s)",
                    owner,
                    values.len() - 1
                );
            }
            let target = parse_name(&values[0])?;
            vec![RData::CNAME(rdata::CNAME(target))]
        }

        RecordType::TXT => {
            if let Some(long) = values.iter().find(|v| v.len() > MAX_TXT_SEGMENT_LEN) {
                return Err(invalid(format!(
                    "TXT segment of {} bytes exceeds {MAX_TXT_SEGMENT_LEN} bytes",
                    long.len()
                ))
                .into());
            }
            vec![RData::TXT(rdata::TXT::new(values.to_vec()))]
        }
    };

    let records = payloads
        .into_iter()
        .map(|payload| {
            let mut record = Record::from_rdata(owner.clone(), ttl, payload);
            record.set_dns_class(DNSClass::IN);
            record
        })
        .collect();

    Ok(ResourceRecordSet {
        name: owner,
        record_type,
        ttl,
        records,
    })
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
