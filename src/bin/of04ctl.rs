//! Thin CLI wrapper around [`openflow_core::launch`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;

use openflow_core::{launch, Arbiter, Connection, ControllerConfig, ControllerEvent, Nexus, RaisedEvent};

#[derive(Parser, Debug)]
#[command(name = "of04ctl", about = "Minimal OpenFlow 1.3 controller front-end")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:6653")]
    listen: SocketAddr,

    /// Component name (auto-suffixed if already in use by another launch() in process).
    #[arg(long)]
    name: Option<String>,

    /// Directory to write per-connection pcap-style capture files into.
    #[arg(long)]
    pcap_dir: Option<PathBuf>,
}

/// A nexus that just logs every event at the requested dpid scope; real applications
/// supply their own.
struct LoggingNexus;

#[async_trait]
impl Nexus for LoggingNexus {
    async fn raise_event_no_errors(&self, event: ControllerEvent) -> Option<RaisedEvent> {
        tracing::info!(?event, "controller event");
        None
    }

    async fn connect(&self, con: &Connection) {
        tracing::info!(connection = %con.id(), "nexus connect");
    }

    async fn disconnect(&self, dpid: Option<u64>) {
        tracing::info!(?dpid, "nexus disconnect");
    }
}

struct SingleNexusArbiter(Arc<dyn Nexus>);

#[async_trait]
impl Arbiter for SingleNexusArbiter {
    async fn get_nexus(&self, _con: &Connection) -> Option<Arc<dyn Nexus>> {
        Some(self.0.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = ControllerConfig { addr: args.listen, name: args.name, pcap_dir: args.pcap_dir };
    let arbiter: Arc<dyn Arbiter> = Arc::new(SingleNexusArbiter(Arc::new(LoggingNexus)));
    let running = Arc::new(openflow_core::AlwaysRunning);

    let handle = launch(cfg, arbiter, running).await?;
    tracing::info!(name = %handle.name, addr = %handle.local_addr, "of04ctl running");
    handle.join().await
}
