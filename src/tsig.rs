// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TSIG (RFC 2845) key handling.
//!
//! Turns [`Credentials`] into a hickory [`TSigner`], and reads TSIG keys from
//! BIND9 key files (the format accepted by `nsupdate -k`).
//!
//! [`UpdateSigner`] is the message finalizer handed to the hickory client
//! streams: it signs every update and verifies the TSIG of the answer when the
//! server sends one.

use crate::constants::TSIG_FUDGE_TIME_SECS;
use crate::errors::{ConfigurationError, ProtocolError, Result};
use crate::names::parse_name;
use crate::types::{Credentials, TsigAlgorithm};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hickory_proto::error::{ProtoError, ProtoErrorKind, ProtoResult};
use hickory_proto::op::{Message, MessageFinalizer, MessageVerifier};
use hickory_proto::rr::dnssec::rdata::tsig::TsigAlgorithm as WireTsigAlgorithm;
use hickory_proto::rr::dnssec::tsig::TSigner;
use hickory_proto::rr::{Record, RecordType};
use hickory_proto::xfer::DnsResponse;
use tracing::warn;

/// Prefix of the error message produced when a response TSIG does not verify.
pub const RESPONSE_VERIFICATION_FAILED: &str = "TSIG verification of response failed";

/// Map our algorithm to the hickory wire algorithm.
#[must_use]
pub fn wire_algorithm(algorithm: TsigAlgorithm) -> WireTsigAlgorithm {
    match algorithm {
        TsigAlgorithm::HmacMd5 => WireTsigAlgorithm::HmacMd5,
        TsigAlgorithm::HmacSha1 => WireTsigAlgorithm::HmacSha1,
        TsigAlgorithm::HmacSha224 => WireTsigAlgorithm::HmacSha224,
        TsigAlgorithm::HmacSha256 => WireTsigAlgorithm::HmacSha256,
        TsigAlgorithm::HmacSha384 => WireTsigAlgorithm::HmacSha384,
        TsigAlgorithm::HmacSha512 => WireTsigAlgorithm::HmacSha512,
    }
}

/// Decode a shared secret.
///
/// Secrets are base64 encoded by convention (whitespace is ignored, as BIND9
/// splits long secrets). A secret that is not valid base64 is used verbatim.
#[must_use]
pub fn decode_secret(secret: &str) -> Vec<u8> {
    let compact: String = secret.chars().filter(|c| !c.is_whitespace()).collect();
    match BASE64.decode(compact.as_bytes()) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        _ => secret.as_bytes().to_vec(),
    }
}

/// Create a TSIG signer from credentials.
///
/// # Errors
///
/// Returns an error if the credentials are incomplete, the key name is not a
/// valid domain name, or the algorithm cannot be used for signing (only the
/// SHA-2 family is implemented by the signing backend).
pub fn create_tsig_signer(credentials: &Credentials) -> Result<TSigner> {
    credentials.validate()?;

    let key_name = parse_name(&credentials.tsig_key_name)?;
    let key = decode_secret(&credentials.tsig_secret);

    TSigner::new(
        key,
        wire_algorithm(credentials.algorithm),
        key_name,
        u16::try_from(TSIG_FUDGE_TIME_SECS).unwrap_or(300),
    )
    .map_err(|_| {
        ConfigurationError::UnsupportedAlgorithm {
            algorithm: credentials.algorithm.to_string(),
        }
        .into()
    })
}

/// Signs outgoing updates with a TSIG key.
///
/// Answers carrying a TSIG record are verified with the request's MAC; a
/// failure surfaces as a [`ProtoError`] whose message starts with
/// [`RESPONSE_VERIFICATION_FAILED`]. Unsigned answers are accepted with a
/// warning, since servers omit the TSIG on some errors (e.g. `BADKEY`).
#[derive(Clone)]
pub struct UpdateSigner {
    signer: TSigner,
}

impl UpdateSigner {
    /// Wrap a TSIG signer.
    #[must_use]
    pub fn new(signer: TSigner) -> Self {
        Self { signer }
    }

    /// Build the signer for `credentials`.
    ///
    /// # Errors
    ///
    /// See [`create_tsig_signer`].
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        create_tsig_signer(credentials).map(Self::new)
    }

    /// The TSIG key name, as written in the signature record.
    #[must_use]
    pub fn key_name(&self) -> String {
        self.signer.signer_name().to_string()
    }
}

impl MessageFinalizer for UpdateSigner {
    fn finalize_message(
        &self,
        message: &Message,
        current_time: u32,
    ) -> ProtoResult<(Vec<Record>, Option<MessageVerifier>)> {
        let (records, verifier) = self.signer.finalize_message(message, current_time)?;
        let Some(mut verify) = verifier else {
            return Ok((records, None));
        };

        let lenient: MessageVerifier = Box::new(move |response: &[u8]| {
            let message = Message::from_vec(response)?;
            if !carries_tsig(&message) {
                if !message.truncated() {
                    warn!(
                        "Response {} carries no TSIG record, accepting it unverified",
                        message.id()
                    );
                }
                return Ok(DnsResponse::new(message, response.to_vec()));
            }
            verify(response)
                .map_err(|e| ProtoError::from(format!("{RESPONSE_VERIFICATION_FAILED}: {e}")))
        });
        Ok((records, Some(lenient)))
    }
}

/// Returns true if `error` reports a response whose TSIG did not verify.
#[must_use]
pub fn is_verification_failure(error: &ProtoError) -> bool {
    matches!(error.kind(), ProtoErrorKind::Msg(message) if message.starts_with(RESPONSE_VERIFICATION_FAILED))
}

/// Returns true if the message ends with a TSIG record.
#[must_use]
pub fn carries_tsig(message: &Message) -> bool {
    message
        .signature()
        .iter()
        .any(|record| record.record_type() == RecordType::TSIG)
}

/// Current time as a TSIG signing time (seconds since the epoch).
///
/// # Errors
///
/// Returns an error if the clock is before the epoch or past 2106.
pub fn signing_time() -> Result<u32> {
    let now = chrono::Utc::now().timestamp();
    u32::try_from(now).map_err(|_| {
        ProtocolError::MessageEncoding {
            name: "TSIG".to_string(),
            reason: format!("system time {now} does not fit a TSIG signing time"),
        }
        .into()
    })
}

/// Parse a BIND9 key file into credentials.
///
/// Expected format (single or multi-line):
/// ```text
/// key "ddns-key.example.com" {
///     algorithm hmac-sha256;
///     secret "base64secret==";
/// };
/// ```
///
/// # Errors
///
/// Returns an error if the key name, algorithm, or secret cannot be found, or
/// the algorithm is unknown.
pub fn parse_tsig_key_file(content: &str) -> Result<Credentials> {
    let content: String = content
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            !(line.starts_with('#') || line.starts_with("//"))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let malformed = |what: &str| ConfigurationError::MissingCredential {
        field: format!("{what} (key file)"),
    };

    let (head, body) = content
        .split_once('{')
        .ok_or_else(|| malformed("key block"))?;

    // Extract key name from the text between the first pair of quotes
    let name = head
        .split('"')
        .nth(1)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| malformed("key name"))?
        .to_string();

    let algorithm_str = body
        .split_once("algorithm")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(|token| token.trim_end_matches(';').trim_matches('"'))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| malformed("algorithm"))?;
    let algorithm: TsigAlgorithm = algorithm_str.parse()?;

    let secret = body
        .split_once("secret")
        .and_then(|(_, rest)| rest.split('"').nth(1))
        .filter(|secret| !secret.trim().is_empty())
        .ok_or_else(|| malformed("secret"))?
        .to_string();

    Ok(Credentials {
        tsig_key_name: name,
        tsig_secret: secret,
        algorithm,
        server: None,
    })
}

#[cfg(test)]
#[path = "tsig_tests.rs"]
mod tsig_tests;
