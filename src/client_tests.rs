// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for update message construction and client configuration

#[cfg(test)]
mod tests {
    use crate::client::{build_update_message, ClientConfig, UpdateClient};
    use crate::records::build_record_set;
    use crate::resolver::ResolverConfig;
    use crate::types::{Credentials, RecordRequest, RecordType, TsigAlgorithm, UpdateOperation};
    use hickory_proto::op::{MessageType, OpCode};
    use hickory_proto::rr::{DNSClass, RecordType as WireRecordType};
    use std::time::Duration;

    fn credentials() -> Credentials {
        Credentials::new("ddns-key.example.com", "c2VjcmV0")
    }

    /// Client whose resolver configuration cannot be used, so any attempt to
    /// send a SOA query fails with `ResolverConfigUnusable`.
    fn offline_client(credentials: Credentials) -> UpdateClient {
        UpdateClient::new(credentials)
            .unwrap()
            .with_resolver(ResolverConfig::default().with_resolv_conf("/nonexistent/resolv.conf"))
    }

    #[test]
    fn test_upsert_message_replaces_rrset() {
        let rrset = build_record_set(
            "foo.example.com",
            RecordType::A,
            &["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            300,
        )
        .unwrap();

        let message = build_update_message(UpdateOperation::Upsert, "example.com", &rrset).unwrap();

        assert_eq!(message.op_code(), OpCode::Update);
        assert_eq!(message.message_type(), MessageType::Query);
        assert!(!message.recursion_desired());

        let zone = &message.queries()[0];
        assert_eq!(message.queries().len(), 1);
        assert_eq!(zone.name().to_string(), "example.com.");
        assert_eq!(zone.query_type(), WireRecordType::SOA);
        assert_eq!(zone.query_class(), DNSClass::IN);

        let updates = message.name_servers();
        assert_eq!(updates.len(), 3);

        let delete_rrset = &updates[0];
        assert_eq!(delete_rrset.dns_class(), DNSClass::ANY);
        assert_eq!(delete_rrset.record_type(), WireRecordType::A);
        assert_eq!(delete_rrset.ttl(), 0);
        assert!(delete_rrset.data().is_none());

        for (added, expected) in updates[1..].iter().zip(&rrset.records) {
            assert_eq!(added.dns_class(), DNSClass::IN);
            assert_eq!(added.ttl(), 300);
            assert_eq!(added.data(), expected.data());
        }
    }

    #[test]
    fn test_delete_message_removes_individual_records() {
        let rrset = build_record_set(
            "foo.example.com",
            RecordType::TXT,
            &["v=meta".to_string()],
            0,
        )
        .unwrap();

        let message = build_update_message(UpdateOperation::Delete, "example.com.", &rrset).unwrap();

        let updates = message.name_servers();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].dns_class(), DNSClass::NONE);
        assert_eq!(updates[0].ttl(), 0);
        assert_eq!(updates[0].record_type(), WireRecordType::TXT);
        assert_eq!(updates[0].data(), rrset.records[0].data());
    }

    #[test]
    fn test_client_requires_credentials() {
        let err = UpdateClient::new(Credentials::new("ddns-key", "")).unwrap_err();
        assert_eq!(err.status_reason(), "MissingCredential");
    }

    #[test]
    fn test_client_rejects_algorithm_that_cannot_sign() {
        let err = UpdateClient::new(credentials().with_algorithm(TsigAlgorithm::HmacSha1))
            .unwrap_err();
        assert_eq!(err.status_reason(), "UnsupportedAlgorithm");
    }

    #[test]
    fn test_client_rejects_malformed_server_override() {
        for server in ["ns1.example.com:abc", "[::1]:abc"] {
            let err = UpdateClient::new(credentials().with_server(server)).unwrap_err();
            assert_eq!(err.status_reason(), "InvalidServer", "{server:?}");
            assert!(!err.is_transient(), "{server:?}");
        }
    }

    #[test]
    fn test_client_configuration() {
        let client = UpdateClient::new(credentials())
            .unwrap()
            .with_timeout(Duration::from_secs(3));
        assert_eq!(client.config().timeout, Duration::from_secs(3));

        let config = ClientConfig::new(credentials());
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.resolver, ResolverConfig::default());
    }

    #[tokio::test]
    async fn test_resolve_server_uses_override_without_query() {
        let client = offline_client(credentials().with_server("ns1.example.com"));
        assert_eq!(
            client.resolve_server("example.com.").await.unwrap(),
            "ns1.example.com:53"
        );

        let client = offline_client(credentials().with_server("10.0.0.53:5353"));
        assert_eq!(
            client.resolve_server("example.com.").await.unwrap(),
            "10.0.0.53:5353"
        );
    }

    #[tokio::test]
    async fn test_resolve_server_without_override_needs_resolver() {
        let client = offline_client(credentials());
        let err = client.resolve_server("example.com.").await.unwrap_err();
        assert_eq!(err.status_reason(), "ResolverConfigUnusable");
    }

    #[tokio::test]
    async fn test_invalid_record_data_fails_before_network() {
        let client = offline_client(credentials());
        let request = RecordRequest::new(
            "foo.example.com",
            RecordType::A,
            vec!["bogus".to_string()],
            300,
        );

        let err = client.create_or_update(&request).await.unwrap_err();
        assert_eq!(err.status_reason(), "InvalidRecordData");

        let err = client.delete(&request).await.unwrap_err();
        assert_eq!(err.status_reason(), "InvalidRecordData");
    }

    #[test]
    fn test_client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<UpdateClient>();
    }
}
