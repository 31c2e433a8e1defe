//! Shared helpers for integration tests

#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::ssl::{Ssl, SslAcceptor, SslMethod};
use openssl::x509::{X509NameBuilder, X509};
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_openssl::SslStream;

use zmq_tls_relay::config::{ConfigValues, RelayConfig};
use zmq_tls_relay::{Relay, RelayState, TlsConnector};

/// TLS acceptor with a throwaway self-signed certificate
pub fn self_signed_acceptor() -> SslAcceptor {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", "localhost").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&key).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.check_private_key().unwrap();
    acceptor.build()
}

/// Complete a server-side TLS handshake on `tcp`
pub async fn accept_tls(acceptor: &SslAcceptor, tcp: TcpStream) -> Option<SslStream<TcpStream>> {
    let ssl = Ssl::new(acceptor.context()).ok()?;
    let mut stream = SslStream::new(ssl, tcp).ok()?;
    Pin::new(&mut stream).accept().await.ok()?;
    Some(stream)
}

/// Remote TLS endpoint; every handshaken connection is handed to the test
pub async fn spawn_tls_remote() -> (u16, mpsc::UnboundedReceiver<SslStream<TcpStream>>) {
    let acceptor = Arc::new(self_signed_acceptor());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (sender, receiver) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = Arc::clone(&acceptor);
            let sender = sender.clone();
            tokio::spawn(async move {
                if let Some(stream) = accept_tls(&acceptor, tcp).await {
                    let _ = sender.send(stream);
                }
            });
        }
    });

    (port, receiver)
}

/// Relay configuration pointing at a local remote, listening on an ephemeral port
pub fn relay_config(remote_port: u16, overrides: ConfigValues) -> Arc<RelayConfig> {
    let base = ConfigValues {
        remote_host: Some("127.0.0.1".to_string()),
        remote_port: Some(remote_port),
        local_port: Some(0),
        connect_timeout: Some(5),
        shutdown_timeout: Some(2),
        ..Default::default()
    };
    Arc::new(RelayConfig::resolve(base.merge(overrides)))
}

/// Bind a relay and run it in the background
pub fn start_relay(config: Arc<RelayConfig>) -> (std::net::SocketAddr, Arc<RelayState>, tokio::task::JoinHandle<zmq_tls_relay::Result<()>>) {
    let connector = TlsConnector::new(config.tls_options())
        .unwrap()
        .with_connect_timeout(config.connect_timeout());
    let state = Arc::new(RelayState::new());
    let relay = Relay::bind(config, connector, Arc::clone(&state)).unwrap();
    let addr = relay.local_addr();
    (addr, state, tokio::spawn(relay.run()))
}
