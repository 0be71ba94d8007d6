//! Optional raw on-wire capture, disabled unless [`crate::config::ControllerConfig::pcap_dir`]
//! is set. Captures the already-reassembled byte stream for each direction rather than
//! literally tapping the socket, which keeps this independent of how a connection's
//! transport is constructed.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub struct PcapWriter {
    file: Mutex<tokio::fs::File>,
}

impl PcapWriter {
    pub async fn create(dir: &Path, peer: std::net::SocketAddr, now: SystemTime) -> anyhow::Result<PcapWriter> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name(peer, now));
        let file = tokio::fs::File::create(&path).await?;
        Ok(PcapWriter { file: Mutex::new(file) })
    }

    pub async fn record_inbound(&self, bytes: &[u8]) {
        self.record(b'<', bytes).await;
    }

    pub async fn record_outbound(&self, bytes: &[u8]) {
        self.record(b'>', bytes).await;
    }

    async fn record(&self, direction: u8, bytes: &[u8]) {
        let mut file = self.file.lock().await;
        let len = (bytes.len() as u32).to_be_bytes();
        if let Err(e) = file.write_all(&[direction]).await {
            tracing::warn!(error = %e, "pcap write failed");
            return;
        }
        let _ = file.write_all(&len).await;
        let _ = file.write_all(bytes).await;
    }
}

fn file_name(peer: std::net::SocketAddr, now: SystemTime) -> PathBuf {
    let stamp = civil_timestamp(now);
    let ip = peer.ip().to_string().replace('.', "_").replace(':', "_");
    PathBuf::from(format!("{stamp}_{ip}_{}.pcap", peer.port()))
}

/// Formats `now` as `YYYY-MM-DD-HHMMxM` without pulling in a date/time crate the rest
/// of the corpus doesn't already use for this.
fn civil_timestamp(now: SystemTime) -> String {
    let secs = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64;
    let days = secs.div_euclid(86_400);
    let secs_of_day = secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    let hour24 = secs_of_day / 3600;
    let minute = (secs_of_day % 3600) / 60;
    let (hour12, meridiem) = match hour24 {
        0 => (12, "AM"),
        1..=11 => (hour24, "AM"),
        12 => (12, "PM"),
        _ => (hour24 - 12, "PM"),
    };
    format!("{year:04}-{month:02}-{day:02}-{hour12:02}{minute:02}{meridiem}")
}

/// Howard Hinnant's `civil_from_days`, days-since-epoch to proleptic Gregorian date.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn known_epoch_formats_correctly() {
        // 2021-01-01T00:00:00Z
        let now = UNIX_EPOCH + Duration::from_secs(1_609_459_200);
        assert_eq!(civil_timestamp(now), "2021-01-01-1200AM");
    }

    #[test]
    fn afternoon_timestamp_uses_pm() {
        // 2021-01-01T13:30:00Z
        let now = UNIX_EPOCH + Duration::from_secs(1_609_459_200 + 13 * 3600 + 30 * 60);
        assert_eq!(civil_timestamp(now), "2021-01-01-0130PM");
    }
}
