// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::SOA;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// Builds the reply to a request; `None` drops the request unanswered.
pub type Handler = Arc<dyn Fn(&Message) -> Option<Message> + Send + Sync>;

/// In-process DNS server answering over UDP (and TCP on the same port).
///
/// Every decoded request is recorded, in arrival order.
pub struct MockDnsServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Message>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    /// Start a server answering every request through `handler`.
    pub async fn start(handler: Handler) -> Self {
        Self::start_with(handler, false).await
    }

    /// Start a server whose UDP answers are truncated (TC bit, no records),
    /// forcing clients to repeat the exchange over TCP.
    pub async fn start_truncating(handler: Handler) -> Self {
        Self::start_with(handler, true).await
    }

    async fn start_with(handler: Handler, truncate_udp: bool) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let listener = TcpListener::bind(addr).await.unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let udp_requests = requests.clone();
        let udp_handler = handler.clone();
        let tcp_requests = requests.clone();
        let tcp_handler = handler;

        tokio::spawn(async move {
            let mut buf = vec![0u8; 65_535];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        let Some(response) = answer(&buf[..len], &udp_requests, &udp_handler) else {
                            continue;
                        };
                        let response = if truncate_udp { truncated(&response) } else { response };
                        let _ = socket.send_to(&response, peer).await;
                    }
                    result = listener.accept() => {
                        let Ok((mut stream, _)) = result else { continue };
                        let requests = tcp_requests.clone();
                        let handler = tcp_handler.clone();
                        tokio::spawn(async move {
                            let mut len_buf = [0u8; 2];
                            if stream.read_exact(&mut len_buf).await.is_err() {
                                return;
                            }
                            let mut request = vec![0u8; usize::from(u16::from_be_bytes(len_buf))];
                            if stream.read_exact(&mut request).await.is_err() {
                                return;
                            }
                            if let Some(response) = answer(&request, &requests, &handler) {
                                let prefix = u16::try_from(response.len()).unwrap().to_be_bytes();
                                let _ = stream.write_all(&prefix).await;
                                let _ = stream.write_all(&response).await;
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The server as a `host:port` string.
    pub fn server(&self) -> String {
        self.addr.to_string()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<Message> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests with the given opcode.
    pub fn requests_with(&self, op_code: OpCode) -> Vec<Message> {
        self.requests()
            .into_iter()
            .filter(|message| message.op_code() == op_code)
            .collect()
    }

    /// Names of the SOA queries received, in order.
    pub fn soa_queries(&self) -> Vec<String> {
        self.requests_with(OpCode::Query)
            .iter()
            .flat_map(|message| message.queries().to_vec())
            .filter(|query| query.query_type() == RecordType::SOA)
            .map(|query| query.name().to_string())
            .collect()
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn answer(
    request: &[u8],
    requests: &Arc<Mutex<Vec<Message>>>,
    handler: &Handler,
) -> Option<Vec<u8>> {
    let message = Message::from_vec(request).ok()?;
    requests.lock().unwrap().push(message.clone());
    handler(&message)?.to_vec().ok()
}

fn truncated(response: &[u8]) -> Vec<u8> {
    // Header only, TC set, all section counts zero
    let mut header = response[..12].to_vec();
    header[2] |= 0x02;
    header[4..12].fill(0);
    header
}

/// An empty response to `request` with `code`.
pub fn reply(request: &Message, code: ResponseCode) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_response_code(code);
    response.add_queries(request.queries().to_vec());
    response
}

/// SOA record data with the given primary server.
pub fn soa(mname: &str) -> SOA {
    SOA::new(
        Name::from_str(mname).unwrap(),
        Name::from_str("hostmaster.example.com.").unwrap(),
        2025010101,
        3600,
        600,
        604_800,
        300,
    )
}

/// Answers SOA queries for the listed zones (primary `ns1.<zone>`), NXDOMAIN
/// for other queries, and every update with `update_code`.
pub fn zone_handler(zones: &[&str], update_code: ResponseCode) -> Handler {
    let zones: Vec<String> = zones.iter().map(ToString::to_string).collect();
    Arc::new(move |request: &Message| {
        if request.op_code() == OpCode::Update {
            return Some(reply(request, update_code));
        }

        let query = request.queries().first()?.clone();
        let qname = query.name().to_string();
        if query.query_type() == RecordType::SOA && zones.contains(&qname) {
            let mut response = reply(request, ResponseCode::NoError);
            response.add_answer(Record::from_rdata(
                query.name().clone(),
                300,
                RData::SOA(soa(&format!("ns1.{qname}"))),
            ));
            Some(response)
        } else {
            Some(reply(request, ResponseCode::NXDomain))
        }
    })
}

/// Never answers.
pub fn silent_handler() -> Handler {
    Arc::new(|_: &Message| None)
}

/// Returns true if the message carries a TSIG record.
pub fn has_tsig(message: &Message) -> bool {
    message
        .signature()
        .iter()
        .any(|record| record.record_type() == RecordType::TSIG)
}

/// Query DNS using dig command (if available)
pub fn query_dns_with_dig(
    server: &str,
    port: u16,
    domain: &str,
    record_type: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    use std::process::Command;

    let output = Command::new("dig")
        .arg(format!("@{server}"))
        .arg("-p")
        .arg(port.to_string())
        .arg(domain)
        .arg(record_type)
        .arg("+short")
        .output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(format!(
            "dig command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )
        .into())
    }
}
