// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TSIG credential lookup.
//!
//! Credentials are normally stored in a Kubernetes `Secret` with the keys
//! `tsigKeyName`, `tsigSecret`, and optionally `algorithm` and `server`.
//! Secrets holding only a BIND9 key file under `tsig.key` are accepted too.

use crate::constants::{
    SECRET_KEY_ALGORITHM, SECRET_KEY_SERVER, SECRET_KEY_TSIG_KEY_FILE, SECRET_KEY_TSIG_KEY_NAME,
    SECRET_KEY_TSIG_SECRET,
};
use crate::errors::{ConfigurationError, Result};
use crate::tsig::parse_tsig_key_file;
use crate::types::{Credentials, TsigAlgorithm};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Namespaced reference to a credentials secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretReference {
    /// Secret name
    pub name: String,
    /// Namespace holding the secret
    pub namespace: String,
}

impl SecretReference {
    /// Reference to secret `name` in `namespace`.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Source of TSIG credentials.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Fetch the credentials named by `reference`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the credentials cannot be fetched or
    /// are incomplete.
    async fn get_credentials(&self, reference: &SecretReference) -> Result<Credentials>;
}

/// Provider returning the same credentials for every reference.
#[derive(Debug, Clone)]
pub struct StaticCredentialsProvider {
    credentials: Credentials,
}

impl StaticCredentialsProvider {
    /// Provider handing out `credentials`.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn get_credentials(&self, _reference: &SecretReference) -> Result<Credentials> {
        self.credentials.validate()?;
        Ok(self.credentials.clone())
    }
}

/// Provider reading credentials from Kubernetes secrets.
#[derive(Clone)]
pub struct SecretCredentialsProvider {
    client: Client,
}

impl SecretCredentialsProvider {
    /// Provider reading secrets through `client`.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CredentialsProvider for SecretCredentialsProvider {
    async fn get_credentials(&self, reference: &SecretReference) -> Result<Credentials> {
        let secret_api: Api<Secret> = Api::namespaced(self.client.clone(), &reference.namespace);

        let secret = secret_api.get(&reference.name).await.map_err(|e| {
            ConfigurationError::SecretLookup {
                secret: reference.to_string(),
                reason: e.to_string(),
            }
        })?;

        let data = secret
            .data
            .as_ref()
            .ok_or_else(|| ConfigurationError::SecretLookup {
                secret: reference.to_string(),
                reason: "secret has no data".to_string(),
            })?;

        // Convert ByteString to Vec<u8>
        let converted: BTreeMap<String, Vec<u8>> = data
            .iter()
            .map(|(key, value)| (key.clone(), value.0.clone()))
            .collect();

        debug!("Loaded TSIG credentials from secret {}", reference);
        credentials_from_secret_data(&converted)
    }
}

fn utf8_field<'a>(data: &'a BTreeMap<String, Vec<u8>>, field: &str) -> Result<Option<&'a str>> {
    data.get(field)
        .map(|bytes| {
            std::str::from_utf8(bytes)
                .map(str::trim)
                .map_err(|e| {
                    ConfigurationError::InvalidSecret {
                        key_name: field.to_string(),
                        reason: format!("value is not valid UTF-8: {e}"),
                    }
                    .into()
                })
        })
        .transpose()
}

/// Build credentials from the data of a secret.
///
/// Reads `tsigKeyName` and `tsigSecret` (required), `algorithm` (defaults to
/// `hmac-sha256`) and `server` (optional). If neither key name nor secret is
/// present, a BIND9 key file stored under `tsig.key` is parsed instead.
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingCredential`] naming the first missing
/// key, [`ConfigurationError::UnsupportedAlgorithm`] for an unknown algorithm
/// and [`ConfigurationError::InvalidSecret`] for values that are not UTF-8.
pub fn credentials_from_secret_data(data: &BTreeMap<String, Vec<u8>>) -> Result<Credentials> {
    let key_name = utf8_field(data, SECRET_KEY_TSIG_KEY_NAME)?;
    let secret = utf8_field(data, SECRET_KEY_TSIG_SECRET)?;
    let server = utf8_field(data, SECRET_KEY_SERVER)?
        .filter(|server| !server.is_empty())
        .map(str::to_string);

    if key_name.is_none() && secret.is_none() {
        if let Some(key_file) = utf8_field(data, SECRET_KEY_TSIG_KEY_FILE)? {
            let mut credentials = parse_tsig_key_file(key_file)?;
            credentials.server = server;
            return Ok(credentials);
        }
    }

    let algorithm = match utf8_field(data, SECRET_KEY_ALGORITHM)? {
        Some(algorithm) if !algorithm.is_empty() => algorithm.parse::<TsigAlgorithm>()?,
        _ => TsigAlgorithm::default(),
    };

    let credentials = Credentials {
        tsig_key_name: key_name.unwrap_or_default().to_string(),
        tsig_secret: secret.unwrap_or_default().to_string(),
        algorithm,
        server,
    };
    credentials.validate()?;
    Ok(credentials)
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod credentials_tests;
