// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the RFC 2136 update client.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port for queries and dynamic updates
pub const DNS_PORT: u16 = 53;

/// Largest message sent over UDP without EDNS(0) (RFC 1035 §4.2.1)
pub const MAX_UDP_MESSAGE_SIZE: usize = 512;

// ============================================================================
// TSIG Constants
// ============================================================================

/// TSIG fudge time in seconds (allows for clock skew)
pub const TSIG_FUDGE_TIME_SECS: u64 = 300;

/// Algorithm used when credentials do not name one
pub const DEFAULT_TSIG_ALGORITHM: &str = "hmac-sha256";

// ============================================================================
// Resolver Constants
// ============================================================================

/// Default location of the system resolver configuration
pub const DEFAULT_RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Default bound on a single network exchange (SOA query or update)
pub const DEFAULT_EXCHANGE_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Secret Data Keys
// ============================================================================

/// Secret key holding the TSIG key name
pub const SECRET_KEY_TSIG_KEY_NAME: &str = "tsigKeyName";

/// Secret key holding the TSIG shared secret
pub const SECRET_KEY_TSIG_SECRET: &str = "tsigSecret";

/// Secret key holding the optional TSIG algorithm
pub const SECRET_KEY_ALGORITHM: &str = "algorithm";

/// Secret key holding the optional server override
pub const SECRET_KEY_SERVER: &str = "server";

/// Secret key holding a BIND9 key file (fallback format)
pub const SECRET_KEY_TSIG_KEY_FILE: &str = "tsig.key";

// ============================================================================
// Metrics Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
pub const METRICS_NAMESPACE: &str = "rfc2136";
