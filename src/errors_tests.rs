// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for error classification

#[cfg(test)]
mod tests {
    use crate::errors::{
        rcode_name, ConfigurationError, DnsUpdateError, NetworkError, ProtocolError,
        ResolutionError,
    };
    use hickory_proto::op::ResponseCode;

    fn rejected(code: ResponseCode) -> DnsUpdateError {
        ProtocolError::Rejected {
            operation: "upsert".to_string(),
            zone: "example.com.".to_string(),
            name: "www.example.com.".to_string(),
            record_type: "A".to_string(),
            server: "10.0.0.1:53".to_string(),
            code,
        }
        .into()
    }

    #[test]
    fn test_network_errors_are_transient() {
        let timeout: DnsUpdateError = NetworkError::Timeout {
            server: "10.0.0.1:53".to_string(),
            timeout_ms: 1000,
        }
        .into();
        let refused: DnsUpdateError = NetworkError::ConnectionFailed {
            server: "10.0.0.1:53".to_string(),
            reason: "connection refused".to_string(),
        }
        .into();

        assert!(timeout.is_transient());
        assert!(refused.is_transient());
        assert_eq!(timeout.status_reason(), "Timeout");
        assert_eq!(refused.status_reason(), "ConnectionFailed");
    }

    #[test]
    fn test_servfail_is_transient() {
        let error = rejected(ResponseCode::ServFail);
        assert!(error.is_transient());
        assert!(!error.is_authorization_failure());
        assert_eq!(error.status_reason(), "ServerFailure");
        assert_eq!(error.response_code(), Some(ResponseCode::ServFail));
    }

    #[test]
    fn test_authorization_failures_are_permanent() {
        for code in [ResponseCode::Refused, ResponseCode::NotAuth] {
            let error = rejected(code);
            assert!(!error.is_transient(), "{code:?} must not be retried");
            assert!(error.is_authorization_failure());
        }
        assert_eq!(rejected(ResponseCode::Refused).status_reason(), "UpdateRefused");
        assert_eq!(rejected(ResponseCode::NotAuth).status_reason(), "NotAuthorized");

        let verification: DnsUpdateError = ProtocolError::ResponseVerification {
            server: "10.0.0.1:53".to_string(),
            key_name: "ddns-key".to_string(),
            reason: "bad MAC".to_string(),
        }
        .into();
        assert!(verification.is_authorization_failure());
        assert!(!verification.is_transient());
    }

    #[test]
    fn test_other_rcodes_are_permanent_rejections() {
        let error = rejected(ResponseCode::NotZone);
        assert!(!error.is_transient());
        assert!(!error.is_authorization_failure());
        assert_eq!(error.status_reason(), "UpdateRejected");
    }

    #[test]
    fn test_rejection_message_names_rcode() {
        let message = rejected(ResponseCode::Refused).to_string();
        assert!(message.contains("REFUSED"), "got: {message}");
        assert!(message.contains("www.example.com."), "got: {message}");
        assert!(message.contains("upsert"), "got: {message}");
    }

    #[test]
    fn test_configuration_and_resolution_errors_are_permanent() {
        let missing: DnsUpdateError = ConfigurationError::MissingCredential {
            field: "tsigSecret".to_string(),
        }
        .into();
        let no_zone: DnsUpdateError = ResolutionError::ZoneNotFound {
            name: "www.example.com.".to_string(),
        }
        .into();

        assert!(!missing.is_transient());
        assert!(!no_zone.is_transient());
        assert_eq!(missing.status_reason(), "MissingCredential");
        assert_eq!(no_zone.status_reason(), "ZoneNotFound");
        assert_eq!(missing.response_code(), None);
    }

    #[test]
    fn test_zone_not_found_message() {
        let error = ResolutionError::ZoneNotFound {
            name: "www.example.com.".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "no authoritative zone found for www.example.com."
        );
    }

    #[test]
    fn test_rcode_names() {
        assert_eq!(rcode_name(ResponseCode::NoError), "NOERROR");
        assert_eq!(rcode_name(ResponseCode::Refused), "REFUSED");
        assert_eq!(rcode_name(ResponseCode::NotAuth), "NOTAUTH");
        assert_eq!(rcode_name(ResponseCode::YXRRSet), "YXRRSET");
        assert_eq!(rcode_name(ResponseCode::Unknown(3841)), "RCODE3841");
    }
}
