//! Loading of cluster certificate material
//!
//! The checks never issue certificates. They only confirm that what the operator
//! stored can actually be loaded: a parseable X.509 certificate next to a
//! parseable private key.

use rcgen::KeyPair;
use thiserror::Error;
use x509_parser::prelude::*;

/// PKI errors
#[derive(Debug, Error)]
pub enum PkiError {
    /// PEM framing could not be decoded
    #[error("invalid PEM: {0}")]
    InvalidPem(String),

    /// Certificate parsing error
    #[error("certificate parsing error: {0}")]
    ParseError(String),

    /// Private key parsing error
    #[error("private key parsing error: {0}")]
    InvalidKey(String),
}

/// Result type for PKI operations
pub type Result<T> = std::result::Result<T, PkiError>;

/// Parse PEM-encoded data and return the DER bytes
pub fn parse_pem(pem_data: &str) -> Result<Vec<u8>> {
    let pem_obj = ::pem::parse(pem_data.as_bytes())
        .map_err(|e| PkiError::InvalidPem(format!("failed to parse PEM: {}", e)))?;
    Ok(pem_obj.contents().to_vec())
}

/// Subject and role of a certificate
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    /// Subject common name
    pub common_name: String,
    /// Whether the certificate may sign other certificates
    pub is_ca: bool,
}

impl CertificateInfo {
    /// Parse certificate info from PEM-encoded certificate
    pub fn from_pem(pem_data: &str) -> Result<Self> {
        let der = parse_pem(pem_data)?;
        Self::from_der(&der)
    }

    /// Parse certificate info from DER-encoded certificate
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| PkiError::ParseError(format!("failed to parse certificate: {}", e)))?;

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or("")
            .to_string();

        Ok(Self {
            common_name,
            is_ca: cert.is_ca(),
        })
    }
}

/// Parse a certificate after checking its private key parses
fn load_keyed(cert_pem: &str, key_pem: &str) -> Result<CertificateInfo> {
    KeyPair::from_pem(key_pem)
        .map_err(|e| PkiError::InvalidKey(format!("failed to parse key: {}", e)))?;
    CertificateInfo::from_pem(cert_pem)
}

/// A cluster certificate authority (transport or HTTP)
#[derive(Debug, Clone)]
pub struct CertificateAuthority {
    info: CertificateInfo,
}

impl CertificateAuthority {
    /// Load a CA from its PEM certificate and private key
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        Ok(Self {
            info: load_keyed(cert_pem, key_pem)?,
        })
    }

    /// Parsed certificate details
    pub fn cert_info(&self) -> &CertificateInfo {
        &self.info
    }
}

/// A pod's transport certificate and key
#[derive(Debug, Clone)]
pub struct TransportCertificate {
    info: CertificateInfo,
}

impl TransportCertificate {
    /// Load a transport certificate from PEM certificate and private key
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        Ok(Self {
            info: load_keyed(cert_pem, key_pem)?,
        })
    }

    /// Parsed certificate details
    pub fn cert_info(&self) -> &CertificateInfo {
        &self.info
    }
}
