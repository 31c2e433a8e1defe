//! Outbound TLS connector
//!
//! Dials the remote node and negotiates TLS on top of the TCP stream. The
//! remote nodes this relay talks to are self-hosted and usually present
//! self-signed certificates, so chain and hostname verification are off
//! unless explicitly enabled in the configuration.

use log::{debug, info, warn};
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use std::io;
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_openssl::SslStream;

use super::version::TlsVersion;
use crate::common::{RelayError, Result};

/// Encrypted upstream stream returned by [`TlsConnector::connect`]
pub type TlsStream = SslStream<TcpStream>;

/// TLS client settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TlsOptions {
    /// Highest protocol version offered to the remote
    pub max_version: TlsVersion,
    /// Verify the remote certificate chain against the system trust store
    pub verify_peer: bool,
    /// Check the remote certificate against the dialed host name
    pub verify_hostname: bool,
}

/// Outbound TLS connector
///
/// Cheap to share behind an `Arc`; every call to [`connect`](Self::connect)
/// creates an independent session.
pub struct TlsConnector {
    connector: SslConnector,
    options: TlsOptions,
    connect_timeout: Option<Duration>,
}

impl TlsConnector {
    /// Build a connector from `options`
    ///
    /// # Errors
    ///
    /// Returns an error if openssl rejects the context settings.
    pub fn new(options: TlsOptions) -> Result<Self> {
        let mut builder = SslConnector::builder(SslMethod::tls_client())?;
        builder.set_max_proto_version(Some(options.max_version.to_ssl_version()))?;

        if options.verify_peer {
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            warn!("Remote certificate verification is disabled; the upstream node is not authenticated");
            builder.set_verify(SslVerifyMode::NONE);
        }

        if !options.verify_hostname {
            warn!("Remote hostname verification is disabled");
        } else if !options.verify_peer {
            warn!("Hostname verification has no effect while certificate verification is disabled");
        }

        debug!("TLS connector ready (max version {})", options.max_version);

        Ok(Self {
            connector: builder.build(),
            options,
            connect_timeout: None,
        })
    }

    /// Bound TCP connect plus handshake by `limit`; `None` waits indefinitely
    pub fn with_connect_timeout(mut self, limit: Option<Duration>) -> Self {
        self.connect_timeout = limit;
        self
    }

    /// The options this connector was built with
    pub fn options(&self) -> &TlsOptions {
        &self.options
    }

    /// Connect to `host:port` and complete the TLS handshake
    ///
    /// No retry is attempted; failures are returned for the caller to report.
    pub async fn connect(&self, host: &str, port: u16) -> Result<TlsStream> {
        let result = match self.connect_timeout {
            Some(limit) => timeout(limit, self.handshake(host, port))
                .await
                .unwrap_or_else(|_| {
                    Err(RelayError::Io(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("connection to {}:{} timed out after {:?}", host, port, limit),
                    )))
                }),
            None => self.handshake(host, port).await,
        };

        if let Err(e) = &result {
            debug!("TLS connection to {}:{} failed: {}", host, port, e);
        }
        result
    }

    async fn handshake(&self, host: &str, port: u16) -> Result<TlsStream> {
        let tcp = TcpStream::connect((host, port)).await?;
        tcp.set_nodelay(true)?;

        let mut config = self.connector.configure()?;
        config.set_verify_hostname(self.options.verify_hostname);
        // into_ssl only sends SNI for host names, not IP literals
        let ssl = config.into_ssl(host)?;

        let mut stream = SslStream::new(ssl, tcp)?;
        Pin::new(&mut stream)
            .connect()
            .await
            .map_err(|e| RelayError::TlsHandshake(e.to_string()))?;

        info!("Connected with TLS: {}", stream.ssl().version_str());
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_every_ceiling() {
        for max_version in [TlsVersion::Tls1_0, TlsVersion::Tls1_1, TlsVersion::Tls1_2, TlsVersion::Tls1_3] {
            let options = TlsOptions { max_version, ..TlsOptions::default() };
            let connector = TlsConnector::new(options).unwrap();
            assert_eq!(connector.options().max_version, max_version);
        }
    }

    #[test]
    fn test_default_options_are_permissive() {
        let options = TlsOptions::default();
        assert!(!options.verify_peer);
        assert!(!options.verify_hostname);
        assert_eq!(options.max_version, TlsVersion::Tls1_2);
    }

    #[tokio::test]
    async fn test_connect_refused_returns_error() {
        // Grab a free port and release it so nothing is listening there
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let connector = TlsConnector::new(TlsOptions::default()).unwrap();
        let result = connector.connect("127.0.0.1", port).await;
        assert!(matches!(result, Err(RelayError::Io(_))));
    }

    #[tokio::test]
    async fn test_handshake_failure_against_plain_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            // Accept and close immediately
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let connector = TlsConnector::new(TlsOptions::default()).unwrap()
            .with_connect_timeout(Some(Duration::from_secs(5)));
        let result = connector.connect("127.0.0.1", port).await;
        assert!(matches!(result, Err(RelayError::TlsHandshake(_))));
    }

    #[tokio::test]
    async fn test_connect_timeout_against_silent_peer() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            // Accept, then hold the socket open without answering the ClientHello
            let (_socket, _) = listener.accept().await.unwrap();
            let _ = done_rx.await;
        });

        let limit = Duration::from_millis(300);
        let connector = TlsConnector::new(TlsOptions::default()).unwrap()
            .with_connect_timeout(Some(limit));

        let started = std::time::Instant::now();
        let result = connector.connect("127.0.0.1", port).await;
        let elapsed = started.elapsed();
        let _ = done_tx.send(());

        match result {
            Err(RelayError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            Err(e) => panic!("expected a timeout, got {}", e),
            Ok(_) => panic!("expected a timeout, got a TLS session"),
        }
        assert!(elapsed >= limit);
        assert!(elapsed < Duration::from_secs(5));
    }
}
