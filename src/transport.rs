// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS message exchange through hickory-client (RFC 1035 §4.2).
//!
//! Messages whose signed encoding fits in 512 bytes go over UDP. Larger
//! messages, and any exchange whose UDP answer has the TC bit set, go over
//! TCP. Each exchange opens its own connection and is bounded by a single
//! timeout covering address lookup, connection, send and receive.
//!
//! Response IDs are matched, and response TSIGs verified, by the hickory
//! client streams.

use crate::constants::MAX_UDP_MESSAGE_SIZE;
use crate::errors::{DnsUpdateError, NetworkError, ProtocolError, Result};
use crate::names::split_host_port;
use crate::tsig::{is_verification_failure, signing_time, UpdateSigner};
use hickory_client::client::AsyncClient;
use hickory_client::udp::UdpClientStream;
use hickory_proto::error::{ProtoError, ProtoErrorKind};
use hickory_proto::iocompat::AsyncIoTokioAsStd;
use hickory_proto::op::Message;
use hickory_proto::tcp::TcpClientStream;
use hickory_proto::xfer::{
    DnsHandle, DnsMultiplexer, DnsRequest, DnsRequestOptions, DnsResponse, FirstAnswer,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream, UdpSocket};
use tracing::debug;

type TokioTcpClientStream = TcpClientStream<AsyncIoTokioAsStd<TcpStream>>;

/// Send `message` to `server` (`host:port`) and return the first response.
///
/// With a `signer` the message is TSIG-signed on the way out and the
/// response TSIG is checked on the way back. The message ID is assigned by
/// the client stream.
///
/// # Errors
///
/// Returns [`NetworkError::Timeout`] if no response arrives within `timeout`,
/// [`NetworkError::AddressResolution`] if the host cannot be resolved,
/// [`NetworkError::ConnectionFailed`] on other transport errors,
/// [`ProtocolError::ResponseVerification`] if the response TSIG does not
/// verify, and [`ProtocolError::MessageEncoding`] if the message cannot be
/// encoded.
pub async fn exchange(
    server: &str,
    message: Message,
    signer: Option<Arc<UpdateSigner>>,
    timeout: Duration,
) -> Result<DnsResponse> {
    let timed_out = || NetworkError::Timeout {
        server: server.to_string(),
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    };

    tokio::time::timeout(timeout, exchange_inner(server, message, signer, timeout))
        .await
        .map_err(|_| timed_out())?
}

async fn exchange_inner(
    server: &str,
    message: Message,
    signer: Option<Arc<UpdateSigner>>,
    timeout: Duration,
) -> Result<DnsResponse> {
    let addr = resolve_socket_addr(server).await?;

    let size = wire_size(&message, signer.as_deref())?;
    if size > MAX_UDP_MESSAGE_SIZE {
        debug!(
            "Message of {} bytes exceeds UDP limit, using TCP for {}",
            size, addr
        );
        return exchange_tcp(server, addr, message, signer, timeout).await;
    }

    let response = exchange_udp(server, addr, message.clone(), signer.clone(), timeout).await?;
    if response.truncated() {
        debug!("Truncated UDP response from {}, retrying over TCP", addr);
        return exchange_tcp(server, addr, message, signer, timeout).await;
    }
    Ok(response)
}

async fn exchange_udp(
    server: &str,
    addr: SocketAddr,
    message: Message,
    signer: Option<Arc<UpdateSigner>>,
    timeout: Duration,
) -> Result<DnsResponse> {
    let key_name = signer.as_ref().map(|signer| signer.key_name());
    let stream =
        UdpClientStream::<UdpSocket, UpdateSigner>::with_timeout_and_signer(addr, timeout, signer);
    let (client, bg) = AsyncClient::connect(stream)
        .await
        .map_err(|e| exchange_error(server, key_name.as_deref(), timeout, &e))?;
    tokio::spawn(bg);

    debug!("Sending message over UDP to {}", addr);
    send(server, key_name.as_deref(), timeout, &client, message).await
}

async fn exchange_tcp(
    server: &str,
    addr: SocketAddr,
    message: Message,
    signer: Option<Arc<UpdateSigner>>,
    timeout: Duration,
) -> Result<DnsResponse> {
    let key_name = signer.as_ref().map(|signer| signer.key_name());
    let (stream, handle) = TokioTcpClientStream::with_timeout(addr, timeout);
    let multiplexer = DnsMultiplexer::<TokioTcpClientStream, UpdateSigner>::with_timeout(
        stream, handle, timeout, signer,
    );
    let (client, bg) = AsyncClient::connect(multiplexer)
        .await
        .map_err(|e| exchange_error(server, key_name.as_deref(), timeout, &e))?;
    tokio::spawn(bg);

    debug!("Sending message over TCP to {}", addr);
    send(server, key_name.as_deref(), timeout, &client, message).await
}

async fn send(
    server: &str,
    key_name: Option<&str>,
    timeout: Duration,
    client: &AsyncClient,
    message: Message,
) -> Result<DnsResponse> {
    let response = client
        .send(DnsRequest::new(message, DnsRequestOptions::default()))
        .first_answer()
        .await
        .map_err(|e| exchange_error(server, key_name, timeout, &e))?;

    debug!(
        "Received response {} ({}) from {}",
        response.id(),
        response.response_code(),
        server
    );
    Ok(response)
}

/// Encoded size of `message` once signed by `signer`.
fn wire_size(message: &Message, signer: Option<&UpdateSigner>) -> Result<usize> {
    let encoding_failed = |e: ProtoError| ProtocolError::MessageEncoding {
        name: message
            .queries()
            .first()
            .map_or_else(String::new, |query| query.name().to_string()),
        reason: e.to_string(),
    };

    match signer {
        Some(signer) => {
            let mut signed = message.clone();
            signed
                .finalize(signer, signing_time()?)
                .map_err(encoding_failed)?;
            Ok(signed.to_vec().map_err(encoding_failed)?.len())
        }
        None => Ok(message.to_vec().map_err(encoding_failed)?.len()),
    }
}

fn exchange_error(
    server: &str,
    key_name: Option<&str>,
    timeout: Duration,
    error: &ProtoError,
) -> DnsUpdateError {
    if is_verification_failure(error) {
        return ProtocolError::ResponseVerification {
            server: server.to_string(),
            key_name: key_name.unwrap_or_default().to_string(),
            reason: error.to_string(),
        }
        .into();
    }

    match error.kind() {
        ProtoErrorKind::Timeout => NetworkError::Timeout {
            server: server.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
        .into(),
        _ => NetworkError::ConnectionFailed {
            server: server.to_string(),
            reason: error.to_string(),
        }
        .into(),
    }
}

/// Resolve a `host:port` server string to a socket address.
///
/// IP literals are used as-is; host names are looked up through the system
/// resolver and the first address returned is used.
///
/// # Errors
///
/// Returns a configuration error for an unparseable server string and
/// [`NetworkError::AddressResolution`] if the host has no address.
pub async fn resolve_socket_addr(server: &str) -> Result<SocketAddr> {
    let (host, port) = split_host_port(server)?;

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let lookup_name = host.trim_end_matches('.');
    let mut addrs = lookup_host((lookup_name, port))
        .await
        .map_err(|e| NetworkError::AddressResolution {
            server: server.to_string(),
            reason: e.to_string(),
        })?;

    addrs.next().ok_or_else(|| {
        NetworkError::AddressResolution {
            server: server.to_string(),
            reason: "host name has no addresses".to_string(),
        }
        .into()
    })
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod transport_tests;
