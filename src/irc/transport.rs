//! TLS transport: connect, register, and pump messages through channels.
//!
//! After [`connect`] returns, a reader task feeds parsed inbound messages
//! into an mpsc channel and a writer task drains an outbound channel onto
//! the socket — the writer task is the serialization point for every
//! component that emits.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use rustls_pki_types::ServerName;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tokio_rustls::TlsConnector;
use tracing::{debug, error, info, warn};

use crate::config::IrcConfig;

use super::message::Message;

/// Capacity of the parsed-inbound channel.
const INBOUND_BUFFER: usize = 64;

/// Capacity of the raw-outbound channel.
const OUTBOUND_BUFFER: usize = 64;

/// The two ends of an established IRC connection.
pub struct Connection {
    /// Parsed inbound messages, produced by the reader task. The channel
    /// closes when the server disconnects or the read side fails.
    pub inbound: mpsc::Receiver<Message>,
    /// Raw outbound path, drained in order by the writer task.
    pub outbound: mpsc::Sender<Message>,
}

/// Connect over TLS, send the NICK/USER registration, and spawn the
/// reader/writer tasks.
///
/// # Errors
///
/// Returns an error when resolution, the TCP connect, the local bind, the
/// TLS handshake, or the registration write fails. All of these are fatal
/// to the process — there is no retry here.
pub async fn connect(irc: &IrcConfig) -> Result<Connection> {
    let (host, port) = irc.server_host_port();
    let tcp = open_tcp(&host, port, irc.local_addr.as_deref()).await?;
    let mut tls = tls_handshake(tcp, &host).await?;

    let nick = &irc.nick;
    let registration = format!("NICK {nick}\r\nUSER {nick} 0 * :{nick}\r\n");
    tls.write_all(registration.as_bytes())
        .await
        .context("failed to send registration")?;

    let (read_half, write_half) = tokio::io::split(tls);
    let (inbound_tx, inbound) = mpsc::channel(INBOUND_BUFFER);
    let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);

    tokio::spawn(read_loop(read_half, inbound_tx));
    tokio::spawn(write_loop(write_half, outbound_rx));

    info!(server = %irc.server, nick = %irc.nick, "connected to IRC server");
    Ok(Connection { inbound, outbound })
}

/// Open the TCP connection, optionally bound to a local address.
async fn open_tcp(host: &str, port: u16, local_addr: Option<&str>) -> Result<TcpStream> {
    let Some(local) = local_addr else {
        return TcpStream::connect((host, port))
            .await
            .with_context(|| format!("failed to connect to {host}:{port}"));
    };

    let local_ip: IpAddr = local
        .trim_matches(['[', ']'])
        .parse()
        .with_context(|| format!("invalid local bind address {local}"))?;

    let remote = tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("failed to resolve {host}"))?
        .find(|addr| addr.is_ipv4() == local_ip.is_ipv4())
        .ok_or_else(|| {
            anyhow::anyhow!("no address of {host} matches the local bind family of {local}")
        })?;

    let socket = if local_ip.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .context("failed to create socket")?;
    socket
        .bind(SocketAddr::new(local_ip, 0))
        .with_context(|| format!("failed to bind local address {local}"))?;
    socket
        .connect(remote)
        .await
        .with_context(|| format!("failed to connect to {host}:{port} from {local}"))
}

/// Perform the TLS client handshake with webpki trust anchors.
async fn tls_handshake(
    tcp: TcpStream,
    host: &str,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let server_name = ServerName::try_from(host.to_owned())
        .with_context(|| format!("invalid TLS server name {host}"))?;
    connector
        .connect(server_name, tcp)
        .await
        .with_context(|| format!("TLS handshake with {host} failed"))
}

/// Read lines, parse, forward. Returning drops the sender, which closes the
/// inbound channel and makes the dispatcher exit fatally.
async fn read_loop<R>(read_half: R, tx: mpsc::Sender<Message>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!(line = %line, "inbound");
                match Message::parse(&line) {
                    Ok(msg) => {
                        if tx.send(msg).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => debug!(error = %e, "dropping unparseable line"),
                }
            }
            Ok(None) => {
                warn!("server closed the connection");
                return;
            }
            Err(e) => {
                error!(error = %e, "read error on IRC connection");
                return;
            }
        }
    }
}

/// Drain the outbound channel onto the socket, one CR-LF-terminated line per
/// message, in channel order.
async fn write_loop<W>(mut write_half: W, mut rx: mpsc::Receiver<Message>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = rx.recv().await {
        let line = msg.to_line();
        debug!(line = %line, "outbound");
        let mut frame = line.into_bytes();
        frame.extend_from_slice(b"\r\n");
        if let Err(e) = write_half.write_all(&frame).await {
            error!(error = %e, "write error on IRC connection");
            return;
        }
    }
}
