//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind to the configured host and port
//! - Report the actual bound address
//!
//! # Design Decisions
//! - Host may be a name; the first resolved address that binds wins
//! - Bind failures are fatal to the bootstrapping generation

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::error::BootstrapError;

/// Bind `host:port` and return the listener with its local address.
pub async fn bind(host: &str, port: u16) -> Result<(TcpListener, SocketAddr), BootstrapError> {
    let address = format!("{host}:{port}");
    let bind_error = |source| BootstrapError::Bind {
        address: address.clone(),
        source,
    };

    let listener = TcpListener::bind((host, port)).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    tracing::info!(address = %local_addr, "Listener bound");

    Ok((listener, local_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_bound_address() {
        let (_listener, addr) = bind("127.0.0.1", 0).await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn address_in_use_is_bind_error() {
        let (_held, addr) = bind("127.0.0.1", 0).await.unwrap();
        let err = bind("127.0.0.1", addr.port()).await.unwrap_err();
        match err {
            BootstrapError::Bind { address, source } => {
                assert_eq!(address, format!("127.0.0.1:{}", addr.port()));
                assert_eq!(source.kind(), std::io::ErrorKind::AddrInUse);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
