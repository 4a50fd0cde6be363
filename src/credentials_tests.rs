// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for credential providers and secret parsing

#[cfg(test)]
mod tests {
    use crate::credentials::{
        credentials_from_secret_data, CredentialsProvider, SecretReference,
        StaticCredentialsProvider,
    };
    use crate::errors::{ConfigurationError, DnsUpdateError};
    use crate::types::{Credentials, TsigAlgorithm};
    use std::collections::BTreeMap;

    fn secret_data(entries: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_parse_secret_with_all_fields() {
        let data = secret_data(&[
            ("tsigKeyName", "ddns-key.example.com"),
            ("tsigSecret", "c2VjcmV0"),
            ("algorithm", "hmac-sha512"),
            ("server", "ns1.example.com:5353"),
        ]);

        let credentials = credentials_from_secret_data(&data).unwrap();
        assert_eq!(credentials.tsig_key_name, "ddns-key.example.com");
        assert_eq!(credentials.tsig_secret, "c2VjcmV0");
        assert_eq!(credentials.algorithm, TsigAlgorithm::HmacSha512);
        assert_eq!(credentials.server.as_deref(), Some("ns1.example.com:5353"));
    }

    #[test]
    fn test_parse_secret_defaults() {
        let data = secret_data(&[("tsigKeyName", "k"), ("tsigSecret", "c2VjcmV0\n")]);

        let credentials = credentials_from_secret_data(&data).unwrap();
        assert_eq!(credentials.algorithm, TsigAlgorithm::HmacSha256);
        assert_eq!(credentials.tsig_secret, "c2VjcmV0");
        assert_eq!(credentials.server, None);
    }

    #[test]
    fn test_parse_secret_missing_secret() {
        let data = secret_data(&[("tsigKeyName", "k")]);
        let err = credentials_from_secret_data(&data).unwrap_err();
        assert!(matches!(
            err,
            DnsUpdateError::Configuration(ConfigurationError::MissingCredential { ref field })
                if field == "tsigSecret"
        ));
    }

    #[test]
    fn test_parse_secret_unknown_algorithm() {
        let data = secret_data(&[
            ("tsigKeyName", "k"),
            ("tsigSecret", "c2VjcmV0"),
            ("algorithm", "hmac-foo"),
        ]);
        let err = credentials_from_secret_data(&data).unwrap_err();
        assert_eq!(err.status_reason(), "UnsupportedAlgorithm");
    }

    #[test]
    fn test_parse_secret_from_key_file() {
        let data = secret_data(&[
            (
                "tsig.key",
                "key \"ddns-key\" {\n    algorithm hmac-sha384;\n    secret \"c2VjcmV0\";\n};\n",
            ),
            ("server", "10.0.0.53"),
        ]);

        let credentials = credentials_from_secret_data(&data).unwrap();
        assert_eq!(credentials.tsig_key_name, "ddns-key");
        assert_eq!(credentials.algorithm, TsigAlgorithm::HmacSha384);
        assert_eq!(credentials.server.as_deref(), Some("10.0.0.53"));
    }

    #[test]
    fn test_parse_secret_rejects_non_utf8() {
        let mut data = secret_data(&[("tsigKeyName", "k")]);
        data.insert("tsigSecret".to_string(), vec![0xff, 0xfe]);
        let err = credentials_from_secret_data(&data).unwrap_err();
        assert_eq!(err.status_reason(), "InvalidSecret");
    }

    #[test]
    fn test_parse_empty_secret() {
        let err = credentials_from_secret_data(&BTreeMap::new()).unwrap_err();
        assert_eq!(err.status_reason(), "MissingCredential");
    }

    #[test]
    fn test_secret_reference_display() {
        let reference = SecretReference::new("dns", "ddns-credentials");
        assert_eq!(reference.to_string(), "dns/ddns-credentials");
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticCredentialsProvider::new(Credentials::new("k", "c2VjcmV0"));
        let reference = SecretReference::new("any", "thing");

        let credentials = provider.get_credentials(&reference).await.unwrap();
        assert_eq!(credentials.tsig_key_name, "k");

        let empty = StaticCredentialsProvider::new(Credentials::new("k", ""));
        assert!(empty.get_credentials(&reference).await.is_err());
    }
}
