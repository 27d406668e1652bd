//! Parser for `show table` output from the HAProxy admin socket.
//!
//! ```text
//! # table: vpn, type: ip, size:102400, used:2
//! 0x55d0c8a0b2a0: key=10.0.0.5 use=0 exp=0 shard=0 conn_cnt=10 conn_cur=3
//! ```

use tracing::debug;

/// One entry of the connection table, as seen in a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSample {
    pub address: String,
    pub current_connections: u64,
    pub cumulative_connections: u64,
}

/// Parse a snapshot. The first line is a header and is always skipped;
/// entries missing `key=`, `conn_cur=` or `conn_cnt=` are dropped.
pub fn parse_snapshot(raw: &str) -> Vec<ConnectionSample> {
    let mut dropped = 0usize;

    let samples: Vec<ConnectionSample> = raw
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let sample = parse_line(line);
            if sample.is_none() {
                dropped += 1;
            }
            sample
        })
        .collect();

    if dropped > 0 {
        debug!("Dropped {} malformed snapshot lines", dropped);
    }

    samples
}

fn parse_line(line: &str) -> Option<ConnectionSample> {
    let mut address = None;
    let mut current = None;
    let mut cumulative = None;

    for token in line.split_whitespace() {
        if let Some(value) = token.strip_prefix("key=") {
            address = Some(value).filter(|v| !v.is_empty());
        } else if let Some(value) = token.strip_prefix("conn_cur=") {
            current = value.parse::<u64>().ok();
        } else if let Some(value) = token.strip_prefix("conn_cnt=") {
            cumulative = value.parse::<u64>().ok();
        }
    }

    Some(ConnectionSample {
        address: address?.to_string(),
        current_connections: current?,
        cumulative_connections: cumulative?,
    })
}
