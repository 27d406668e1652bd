//! Allow/block decisions against the network lists.

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::lists::NetworkList;

/// Outcome of classifying an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allowed,
    Blocked,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Allowed => f.write_str("allowed"),
            Verdict::Blocked => f.write_str("blocked"),
        }
    }
}

/// Why an address got its verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Matched a deny range
    Denied(IpNet),
    /// Matched an allow range and no deny range
    Allowed(IpNet),
    /// Matched neither list
    Unlisted,
    /// Not an IP address
    Unparsable,
}

impl Decision {
    pub fn verdict(&self) -> Verdict {
        match self {
            Decision::Allowed(_) => Verdict::Allowed,
            _ => Verdict::Blocked,
        }
    }
}

/// Classifies addresses: deny list first, then allow list, then default-deny.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    allow: NetworkList,
    deny: NetworkList,
}

impl Classifier {
    pub fn new(allow: NetworkList, deny: NetworkList) -> Self {
        Self { allow, deny }
    }

    pub fn classify(&self, address: &str) -> Verdict {
        self.explain(address).verdict()
    }

    pub fn explain(&self, address: &str) -> Decision {
        let Ok(addr) = address.trim().parse::<IpAddr>() else {
            return Decision::Unparsable;
        };

        if let Some(net) = self.deny.first_match(&addr) {
            return Decision::Denied(*net);
        }
        if let Some(net) = self.allow.first_match(&addr) {
            return Decision::Allowed(*net);
        }
        Decision::Unlisted
    }

    pub fn allow_list(&self) -> &NetworkList {
        &self.allow
    }

    pub fn deny_list(&self) -> &NetworkList {
        &self.deny
    }
}
