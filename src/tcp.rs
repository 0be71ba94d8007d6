//! The accept loop: each accepted connection is driven by a spawned task running a
//! non-blocking `readable()`/`try_read` loop rather than a buffered `AsyncRead`, since
//! the deferred-send backlog logic needs to observe real `WouldBlock`s.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::net::{TcpListener, TcpSocket};

use crate::codec::{unpacker_table, UnpackFn};
use crate::config::HostSignals;
use crate::connection::Connection;
use crate::deferred::DeferredSender;
use crate::events::Arbiter;
use crate::pcap::PcapWriter;

pub struct OfTcpListener {
    listener: TcpListener,
    arbiter: Arc<dyn Arbiter>,
    deferred: Arc<DeferredSender>,
    unpackers: Arc<Vec<Option<UnpackFn>>>,
    pcap_dir: Option<PathBuf>,
}

impl OfTcpListener {
    pub async fn bind(
        addr: SocketAddr,
        arbiter: Arc<dyn Arbiter>,
        pcap_dir: Option<PathBuf>,
    ) -> anyhow::Result<OfTcpListener> {
        let socket = if addr.is_ipv4() { TcpSocket::new_v4()? } else { TcpSocket::new_v6()? };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(16)?;
        Ok(OfTcpListener {
            listener,
            arbiter,
            deferred: DeferredSender::spawn(),
            unpackers: Arc::new(unpacker_table()),
            pcap_dir,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `running` reports false or the listener itself
    /// errors. A per-connection accept failure doesn't stop the loop; a listener-level
    /// error (e.g. the socket was closed out from under us) does.
    pub async fn handle_forever(&self, running: Arc<dyn HostSignals>) -> anyhow::Result<()> {
        while running.running() {
            let (stream, peer) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::error!(error = %e, "listener accept failed, stopping");
                    return Err(e.into());
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!(%peer, error = %e, "set_nodelay failed");
            }
            tracing::info!(%peer, "accepted OpenFlow connection");

            let pcap = match &self.pcap_dir {
                Some(dir) => match PcapWriter::create(dir, peer, SystemTime::now()).await {
                    Ok(writer) => Some(Arc::new(writer)),
                    Err(e) => {
                        tracing::warn!(error = %e, "pcap capture init failed, continuing without it");
                        None
                    }
                },
                None => None,
            };

            let conn = Connection::new(
                stream,
                peer,
                self.arbiter.clone(),
                self.deferred.clone(),
                self.unpackers.clone(),
                pcap,
            );
            tokio::spawn(conn.run());
        }
        Ok(())
    }
}
