//! TLS secrets and certificate summaries.

use std::collections::BTreeMap;

use jiff::Timestamp;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use x509_parser::extensions::GeneralName;

use crate::TRACING_TARGET_QUERY;

/// Secret type of TLS certificates.
pub const TLS_SECRET_TYPE: &str = "kubernetes.io/tls";

/// Source reported for every certificate.
const CERT_SOURCE: &str = "kubernetes";

const TLS_CRT_KEY: &str = "tls.crt";
const TLS_KEY_KEY: &str = "tls.key";

/// Summary of a TLS secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct CertInfo {
    pub name: String,
    pub source: String,
    /// First DNS subject alternative name, empty when absent.
    pub dns_name: String,
    /// Expiry rendered as `%Y-%m-%d %H:%M:%S`, empty when unparseable.
    pub expired: String,
}

/// Parses a PEM certificate, returning its first DNS SAN and its expiry.
///
/// Returns `None` if the data is not a PEM encoded X.509 certificate.
pub fn parse_certificate(data: &[u8]) -> Option<(Option<String>, String)> {
    let block = pem::parse(data).ok()?;
    let (_, cert) = x509_parser::parse_x509_certificate(block.contents()).ok()?;

    let dns_name = cert
        .subject_alternative_name()
        .ok()
        .flatten()
        .and_then(|san| {
            san.value.general_names.iter().find_map(|name| match name {
                GeneralName::DNSName(dns) => Some((*dns).to_owned()),
                _ => None,
            })
        });

    let expired = Timestamp::from_second(cert.validity().not_after.timestamp())
        .map(|ts| ts.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    Some((dns_name, expired))
}

impl From<&Secret> for CertInfo {
    fn from(secret: &Secret) -> Self {
        let name = secret.metadata.name.clone().unwrap_or_default();
        let certificate = secret
            .data
            .as_ref()
            .and_then(|data| data.get(TLS_CRT_KEY))
            .and_then(|crt| parse_certificate(&crt.0));

        if certificate.is_none() {
            tracing::warn!(
                target: TRACING_TARGET_QUERY,
                secret = %name,
                "Failed to parse certificate PEM block"
            );
        }

        let (dns_name, expired) = certificate.unwrap_or_default();
        Self {
            name,
            source: CERT_SOURCE.to_owned(),
            dns_name: dns_name.unwrap_or_default(),
            expired,
        }
    }
}

/// Builds a `kubernetes.io/tls` secret from PEM certificate and key.
pub fn tls_secret(namespace: &str, name: &str, crt: &str, key: &str) -> Secret {
    let data = BTreeMap::from([
        (TLS_CRT_KEY.to_owned(), ByteString(crt.as_bytes().to_vec())),
        (TLS_KEY_KEY.to_owned(), ByteString(key.as_bytes().to_vec())),
    ]);

    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..ObjectMeta::default()
        },
        data: Some(data),
        type_: Some(TLS_SECRET_TYPE.to_owned()),
        ..Secret::default()
    }
}
