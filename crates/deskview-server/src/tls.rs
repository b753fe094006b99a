//! TLS support for the deskview server
//!
//! Either loads a PEM certificate and key from disk or generates a
//! self-signed certificate in memory at startup.

use anyhow::{bail, Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// A PEM certificate, its private key and the certificate fingerprint
pub struct GeneratedCert {
    pub cert_pem: String,
    pub key_pem: String,
    pub fingerprint: String,
}

/// Generate a self-signed certificate for the given hostnames/IPs
pub fn generate_self_signed_cert(hostnames: &[String]) -> Result<GeneratedCert> {
    let mut params = CertificateParams::default();

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, "deskview");
    dn.push(DnType::OrganizationName, "deskview");
    params.distinguished_name = dn;

    let mut san_list = vec![SanType::DnsName("localhost".try_into()?)];
    for hostname in hostnames {
        if let Ok(ip) = hostname.parse::<std::net::IpAddr>() {
            san_list.push(SanType::IpAddress(ip));
        } else if let Ok(dns) = hostname.as_str().try_into() {
            san_list.push(SanType::DnsName(dns));
        }
    }
    san_list.push(SanType::IpAddress(std::net::IpAddr::V4(
        std::net::Ipv4Addr::LOCALHOST,
    )));
    params.subject_alt_names = san_list;

    let key_pair = KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;

    Ok(GeneratedCert {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
        fingerprint: calculate_cert_fingerprint(cert.der()),
    })
}

/// SHA-256 fingerprint of a DER certificate, colon-separated as browsers show it
pub fn calculate_cert_fingerprint(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse a PEM certificate chain and return the leaf certificate in DER
///
/// Every certificate block must parse; the leaf is the first one.
fn leaf_cert_der(pem: &str) -> Result<Vec<u8>> {
    let mut reader = pem.as_bytes();
    let chain = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Malformed PEM certificate")?;

    let leaf = chain.first().context("No certificate in PEM data")?;
    debug!("Certificate chain has {} certificate(s)", chain.len());
    Ok(leaf.to_vec())
}

/// Build the rustls configuration
///
/// Uses `cert`/`key` when both are given, otherwise a fresh self-signed
/// certificate covering `hostnames`. Returns the certificate fingerprint.
pub async fn load_rustls_config(
    cert: Option<&Path>,
    key: Option<&Path>,
    hostnames: &[String],
) -> Result<(RustlsConfig, String)> {
    match (cert, key) {
        (Some(cert_path), Some(key_path)) => {
            let cert_pem = std::fs::read_to_string(cert_path)
                .with_context(|| format!("Failed to read certificate {:?}", cert_path))?;
            let fingerprint = leaf_cert_der(&cert_pem)
                .map(|der| calculate_cert_fingerprint(&der))
                .with_context(|| format!("Invalid certificate file {:?}", cert_path))?;

            let config = RustlsConfig::from_pem_file(cert_path, key_path)
                .await
                .context("Failed to load TLS certificate and key")?;

            info!("Loaded TLS certificate from {:?}", cert_path);
            Ok((config, fingerprint))
        }
        (None, None) => {
            info!("Generating self-signed certificate...");
            let generated = generate_self_signed_cert(hostnames)?;
            let config = RustlsConfig::from_pem(
                generated.cert_pem.into_bytes(),
                generated.key_pem.into_bytes(),
            )
            .await
            .context("Failed to build TLS configuration")?;
            Ok((config, generated.fingerprint))
        }
        _ => bail!("--cert and --key must be given together"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cert_generation() {
        let hostnames = vec!["192.168.1.100".to_string(), "desk.local".to_string()];
        let generated = generate_self_signed_cert(&hostnames).unwrap();
        assert!(generated.cert_pem.contains("BEGIN CERTIFICATE"));
        assert!(generated.key_pem.contains("BEGIN PRIVATE KEY"));
        assert_eq!(generated.fingerprint.len(), 95); // 32 bytes * 2 hex + 31 colons
    }

    #[test]
    fn test_fingerprint_matches_pem_contents() {
        let generated = generate_self_signed_cert(&[]).unwrap();
        let der = leaf_cert_der(&generated.cert_pem).unwrap();
        assert_eq!(calculate_cert_fingerprint(&der), generated.fingerprint);
    }

    #[test]
    fn test_chain_fingerprint_uses_leaf() {
        let leaf = generate_self_signed_cert(&["leaf.local".to_string()]).unwrap();
        let issuer = generate_self_signed_cert(&["issuer.local".to_string()]).unwrap();
        let chain = format!("{}{}", leaf.cert_pem, issuer.cert_pem);

        let der = leaf_cert_der(&chain).unwrap();
        assert_eq!(calculate_cert_fingerprint(&der), leaf.fingerprint);
    }

    #[test]
    fn test_pem_without_certificate() {
        let generated = generate_self_signed_cert(&[]).unwrap();
        assert!(leaf_cert_der(&generated.key_pem).is_err());
        assert!(leaf_cert_der("").is_err());
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = calculate_cert_fingerprint(b"not a real certificate");
        assert!(fp.split(':').all(|pair| pair.len() == 2));
        assert_eq!(fp, fp.to_uppercase());
    }
}
