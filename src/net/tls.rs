//! TLS configuration and certificate loading.

use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore, ServerConfig};

use crate::error::StartupError;

/// Client config trusting the system roots plus the optional extra CA.
pub fn client_config(ca_path: Option<&Path>) -> Result<ClientConfig, StartupError> {
    let mut roots = RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        tracing::debug!(error = %err, "Skipping unreadable system certificate");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    tracing::debug!(added, ignored, "Loaded system root certificates");

    if let Some(path) = ca_path {
        let certs = read_certs(path)?;
        for cert in certs {
            roots.add(cert)?;
        }
        tracing::info!(ca = %path.display(), "Trusting additional CA");
    }

    if roots.is_empty() {
        return Err(StartupError::tls(
            "no trusted root certificates (system store empty and no CA given)",
        ));
    }

    client_config_with_roots(roots)
}

/// Client config over an explicit root store. Never negotiates HTTP/2.
pub fn client_config_with_roots(roots: RootCertStore) -> Result<ClientConfig, StartupError> {
    let config = ClientConfig::builder_with_provider(provider())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

/// Server config for the listener from a PEM chain and key.
pub fn server_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, StartupError> {
    let certs = read_certs(cert_path)?;
    let key = read_key(key_path)?;

    let mut config = ServerConfig::builder_with_provider(provider())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

fn provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::aws_lc_rs::default_provider())
}

fn read_pem(path: &Path) -> Result<Vec<u8>, StartupError> {
    std::fs::read(path).map_err(|source| StartupError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, StartupError> {
    let pem = read_pem(path)?;
    let certs = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| StartupError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if certs.is_empty() {
        return Err(StartupError::tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn read_key(path: &Path) -> Result<PrivateKeyDer<'static>, StartupError> {
    let pem = read_pem(path)?;
    rustls_pemfile::private_key(&mut pem.as_slice())
        .map_err(|source| StartupError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| StartupError::tls(format!("no private key found in {}", path.display())))
}
