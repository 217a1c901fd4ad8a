//! Host access control.
//!
//! # Responsibilities
//! - Load the filter list once at startup
//! - Decide whether a requested host is blocked, by hostname literal or by
//!   CIDR subnet of its resolved IPv4 address
//!
//! # Matching Rules
//!
//! | Entry | Compared against | Example |
//! |-------|------------------|---------|
//! | starts with a digit | resolved IPv4 of the cleaned host, first `mask` bits | `10.0.0.0/8` blocks `10.1.2.3` |
//! | anything else | raw `Host` header value, exact and case-sensitive | `ads.example.com` does not block `ads.example.com:8080` |
//!
//! # Design Decisions
//! - The list is parsed once into immutable rules and shared read-only by all workers
//! - First matching rule wins, in file order
//! - Numeric lines that are not valid IPv4 addresses are skipped with a warning
//! - A missing or out-of-range mask means `/32`

use std::fmt;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use crate::net::resolve::{clean_host, resolve_ipv4, ResolveError};

/// Error type for filter file loading.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("failed to read filter file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One line of the filter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRule {
    /// Hostname literal, compared verbatim with the raw Host value.
    Host(String),
    /// IPv4 network with a prefix length in `0..=32`.
    Subnet { network: Ipv4Addr, mask: u8 },
}

impl FilterRule {
    /// Parse one non-empty line. Returns `None` for numeric lines that are not IPv4.
    fn parse(line: &str) -> Option<Self> {
        if !line.starts_with(|c: char| c.is_ascii_digit()) {
            return Some(FilterRule::Host(line.to_string()));
        }

        let (ip, mask) = match line.split_once('/') {
            Some((ip, mask)) => (ip, parse_mask(mask)),
            None => (line, 32),
        };

        let network = ip.parse::<Ipv4Addr>().ok()?;
        Some(FilterRule::Subnet { network, mask })
    }

    /// Returns true if this rule blocks the request.
    pub fn matches(&self, raw_host: &str, addr: Ipv4Addr) -> bool {
        match self {
            FilterRule::Host(literal) => literal == raw_host,
            FilterRule::Subnet { network, mask } => {
                let bits = prefix_bits(*mask);
                (u32::from(*network) ^ u32::from(addr)) & bits == 0
            }
        }
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterRule::Host(host) => write!(f, "{}", host),
            FilterRule::Subnet { network, mask } => write!(f, "{}/{}", network, mask),
        }
    }
}

fn parse_mask(mask: &str) -> u8 {
    match mask.trim().parse::<u8>() {
        Ok(bits) if bits <= 32 => bits,
        _ => 32,
    }
}

/// Leading `mask` bits set.
fn prefix_bits(mask: u8) -> u32 {
    if mask == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(mask.min(32)))
    }
}

/// Outcome of checking a host against the filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict<'a> {
    /// No rule matched; the address the host resolved to.
    Allowed(Ipv4Addr),
    /// A rule matched.
    Blocked { addr: Ipv4Addr, rule: &'a FilterRule },
}

/// Immutable, ordered list of filter rules.
#[derive(Debug, Clone, Default)]
pub struct FilterList {
    rules: Vec<FilterRule>,
}

impl FilterList {
    /// Parse filter file content. Accepts `\n` or `\r\n` line endings.
    pub fn parse(content: &str) -> Self {
        let mut rules = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match FilterRule::parse(line) {
                Some(rule) => rules.push(rule),
                None => tracing::warn!(line = index + 1, entry = %line, "Skipping invalid IP filter entry"),
            }
        }

        Self { rules }
    }

    /// Read and parse the filter file. An unreadable file is fatal to startup.
    pub fn load(path: &Path) -> Result<Self, FilterError> {
        let content = fs::read_to_string(path).map_err(|source| FilterError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let list = Self::parse(&content);
        tracing::info!(path = %path.display(), rules = list.len(), "Filter list loaded");
        Ok(list)
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule matching either the raw host literal or the resolved address.
    pub fn matches(&self, raw_host: &str, addr: Ipv4Addr) -> Option<&FilterRule> {
        self.rules.iter().find(|rule| rule.matches(raw_host, addr))
    }

    /// Resolve the cleaned host and check it against every rule.
    pub fn is_filtered(&self, raw_host: &str) -> Result<FilterVerdict<'_>, ResolveError> {
        let addr = resolve_ipv4(clean_host(raw_host))?;

        Ok(match self.matches(raw_host, addr) {
            Some(rule) => FilterVerdict::Blocked { addr, rule },
            None => FilterVerdict::Allowed(addr),
        })
    }
}
