//! `ControllerConfig` + `launch()` — the library entry point `src/bin/of04ctl.rs` and
//! any embedding application call into.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use crate::events::Arbiter;
use crate::tcp::OfTcpListener;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub addr: SocketAddr,
    pub name: Option<String>,
    pub pcap_dir: Option<PathBuf>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig { addr: "0.0.0.0:6653".parse().unwrap(), name: None, pcap_dir: None }
    }
}

/// The host runtime's lifecycle signal, kept as a small trait so `launch` stays
/// testable without a real hosting runtime.
pub trait HostSignals: Send + Sync {
    fn running(&self) -> bool;
}

pub struct AlwaysRunning;

impl HostSignals for AlwaysRunning {
    fn running(&self) -> bool {
        true
    }
}

/// Disambiguates repeated `launch()` calls under the same name ("of04", "of04-2", ...),
/// the way a running process registers each of its components under a unique name.
#[derive(Default)]
pub struct NameRegistry {
    used: Mutex<HashSet<String>>,
}

impl NameRegistry {
    pub fn register(&self, base: &str) -> String {
        let mut used = self.used.lock().unwrap();
        if used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{base}-{suffix}");
            if used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

fn name_registry() -> &'static NameRegistry {
    static REGISTRY: OnceLock<NameRegistry> = OnceLock::new();
    REGISTRY.get_or_init(NameRegistry::default)
}

pub struct ControllerHandle {
    pub name: String,
    pub local_addr: SocketAddr,
    join: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl ControllerHandle {
    pub async fn join(self) -> anyhow::Result<()> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("controller task panicked: {e}")),
        }
    }
}

/// Binds a listener and spawns the accept loop, returning a handle once the socket is
/// actually bound (so callers using `addr:0` can read back the chosen port).
pub async fn launch(
    cfg: ControllerConfig,
    arbiter: Arc<dyn Arbiter>,
    running: Arc<dyn HostSignals>,
) -> anyhow::Result<ControllerHandle> {
    let name = name_registry().register(cfg.name.as_deref().unwrap_or("of04"));
    let listener = OfTcpListener::bind(cfg.addr, arbiter, cfg.pcap_dir.clone()).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(name = %name, addr = %local_addr, "openflow controller listening");
    let join = tokio::spawn(async move { listener.handle_forever(running).await });
    Ok(ControllerHandle { name, local_addr, join })
}
