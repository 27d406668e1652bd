//! Allow/deny network lists.
//!
//! Lists are plain text, one CIDR per line. They are read once at startup
//! and never change afterwards.

use ipnet::IpNet;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::WatchError;
use crate::fs_abstraction::FileSystem;

/// An ordered sequence of network ranges.
///
/// Membership is "first range in file order that contains the address";
/// overlapping ranges are kept as written, not merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkList {
    nets: Vec<IpNet>,
}

impl NetworkList {
    pub fn new(nets: Vec<IpNet>) -> Self {
        Self { nets }
    }

    /// Parse list content. Blank lines and `#` comments are ignored,
    /// unparsable lines are skipped.
    pub fn parse(content: &str) -> Self {
        let nets = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let parsed = if line.contains('/') {
                    line.parse::<IpNet>().ok()
                } else {
                    line.parse::<IpAddr>().ok().map(IpNet::from)
                };
                if parsed.is_none() {
                    debug!("Skipping unparsable list entry: {}", line);
                }
                parsed
            })
            .collect();
        Self { nets }
    }

    /// Load a list file. A missing file is an empty list.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, WatchError> {
        match fs.read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(WatchError::ListLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Load a list file, degrading any failure to an empty list.
    pub fn load_or_empty(fs: &dyn FileSystem, path: &Path) -> Self {
        match Self::load(fs, path) {
            Ok(list) => {
                info!("Loaded {} ranges from {}", list.len(), path.display());
                list
            }
            Err(e) => {
                warn!("{}; using an empty list", e);
                Self::default()
            }
        }
    }

    /// First range containing `addr`, in list order.
    pub fn first_match(&self, addr: &IpAddr) -> Option<&IpNet> {
        self.nets.iter().find(|net| net.contains(addr))
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.first_match(addr).is_some()
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpNet> {
        self.nets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_abstraction::MockFileSystem;
    use std::io;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_cidrs_and_hosts() {
        let list = NetworkList::parse("10.0.0.0/8\n192.168.1.7\n");
        assert_eq!(list.len(), 2);
        assert!(list.contains(&ip("10.1.2.3")));
        assert!(list.contains(&ip("192.168.1.7")));
        assert!(!list.contains(&ip("192.168.1.8")));
    }

    #[test]
    fn test_parse_skips_comments_blanks_and_garbage() {
        let content = "# header\n\n  \n10.0.0.0/24\nnot-a-network\n10.0.0.0/33\n  # indented\n";
        let list = NetworkList::parse(content);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let list = NetworkList::parse("  172.16.0.0/12\t\n");
        assert_eq!(list.len(), 1);
        assert!(list.contains(&ip("172.20.0.1")));
    }

    #[test]
    fn test_first_match_uses_file_order() {
        let list = NetworkList::parse("10.0.0.0/8\n10.0.0.0/24\n");
        let matched = list.first_match(&ip("10.0.0.5")).unwrap();
        assert_eq!(matched.prefix_len(), 8);
    }

    #[test]
    fn test_ipv6_ranges() {
        let list = NetworkList::parse("2001:db8::/32\n");
        assert!(list.contains(&ip("2001:db8::1")));
        assert!(!list.contains(&ip("10.0.0.1")));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let mut mock = MockFileSystem::new();
        mock.expect_read_to_string()
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "missing")));

        let list = NetworkList::load(&mock, Path::new("/etc/missing.lst")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_load_unreadable_file_is_error() {
        let mut mock = MockFileSystem::new();
        mock.expect_read_to_string()
            .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));

        let result = NetworkList::load(&mock, Path::new("/etc/secret.lst"));
        assert!(matches!(result, Err(WatchError::ListLoad { .. })));
    }

    #[test]
    fn test_load_or_empty_degrades() {
        let mut mock = MockFileSystem::new();
        mock.expect_read_to_string()
            .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")));

        assert!(NetworkList::load_or_empty(&mock, Path::new("/x")).is_empty());
    }

    #[test]
    fn test_load_reads_through_filesystem() {
        let mut mock = MockFileSystem::new();
        mock.expect_read_to_string()
            .withf(|p| p == Path::new("/etc/allow.lst"))
            .returning(|_| Ok("10.0.0.0/24\n".to_string()));

        let list = NetworkList::load(&mock, Path::new("/etc/allow.lst")).unwrap();
        assert!(list.contains(&ip("10.0.0.5")));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn ipv4_cidr_string_strategy() -> impl Strategy<Value = String> {
        (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255, 0u8..=32)
            .prop_map(|(a, b, c, d, prefix)| format!("{}.{}.{}.{}/{}", a, b, c, d, prefix))
    }

    proptest! {
        /// Every well-formed line survives parsing
        #[test]
        fn prop_valid_lines_all_parsed(lines in prop::collection::vec(ipv4_cidr_string_strategy(), 0..50)) {
            let list = NetworkList::parse(&lines.join("\n"));
            prop_assert_eq!(list.len(), lines.len());
        }

        /// Arbitrary text never panics
        #[test]
        fn prop_arbitrary_content_no_panic(content in ".*") {
            let _ = NetworkList::parse(&content);
        }
    }
}
