//! TCP listener binding for the server components.
//!
//! # Responsibilities
//! - Resolve the configured listen host (empty = all interfaces)
//! - Bind before the server reports itself started
//! - Hand a non-blocking std listener to axum-server

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// Failed to convert the listener for serving.
    #[error("failed to prepare listener on {addr}: {source}")]
    Prepare {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// A bound listener ready to be served.
#[derive(Debug)]
pub struct BoundListener {
    inner: std::net::TcpListener,
    local_addr: SocketAddr,
}

impl BoundListener {
    /// Bind `listen:port`. An empty `listen` binds every IPv4 interface.
    pub async fn bind(listen: &str, port: u16) -> Result<Self, ListenerError> {
        let listen = listen.trim().trim_start_matches('[').trim_end_matches(']');
        let display = display_addr(listen, port);

        let listener = match listen.parse::<IpAddr>() {
            Ok(ip) => TcpListener::bind(SocketAddr::new(ip, port)).await,
            Err(_) if listen.is_empty() => {
                TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)).await
            }
            Err(_) => TcpListener::bind((listen, port)).await,
        }
        .map_err(|source| ListenerError::Bind {
            addr: display.clone(),
            source,
        })?;

        let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind {
            addr: display,
            source,
        })?;

        // Stays non-blocking, which axum-server requires.
        let inner = listener
            .into_std()
            .map_err(|source| ListenerError::Prepare {
                addr: local_addr,
                source,
            })?;

        tracing::debug!(address = %local_addr, "Listener bound");
        Ok(Self { inner, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn into_std(self) -> std::net::TcpListener {
        self.inner
    }
}

fn display_addr(listen: &str, port: u16) -> String {
    if listen.contains(':') {
        format!("[{listen}]:{port}")
    } else if listen.is_empty() {
        format!("0.0.0.0:{port}")
    } else {
        format!("{listen}:{port}")
    }
}
