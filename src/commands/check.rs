//! Check command implementation.

use anyhow::Result;
use std::net::IpAddr;
use std::path::Path;

use crate::classifier::Decision;
use crate::config::Config;
use crate::fs_abstraction::real_fs;
use crate::monitor::load_classifier;

/// Describe a decision for humans
pub fn describe(address: &str, decision: &Decision) -> String {
    match decision {
        Decision::Denied(net) => format!("{} is BLOCKED (deny list: {})", address, net),
        Decision::Allowed(net) => format!("{} is ALLOWED (allow list: {})", address, net),
        Decision::Unlisted => format!("{} is BLOCKED (in neither list)", address),
        Decision::Unparsable => format!("{} is BLOCKED (not an IP address)", address),
    }
}

/// Run the check command
pub async fn run(ip_str: &str, config_path: &Path) -> Result<()> {
    let ip_str = ip_str.trim();
    ip_str
        .parse::<IpAddr>()
        .map_err(|_| anyhow::anyhow!("Invalid IP address: {}", ip_str))?;

    let config = Config::load_or_default(config_path)?;
    let classifier = load_classifier(real_fs(), &config);
    let decision = classifier.explain(ip_str);

    println!();
    println!("{}", describe(ip_str, &decision));
    println!();

    Ok(())
}
