use std::net::IpAddr;
use ipnet::IpNet;

use crate::error::{Result, ScanError};

/// What kind of target string the user handed us. nmap does the real parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetKind {
    Address(IpAddr),
    Network(IpNet),
    Range { start: IpAddr, end: IpAddr },
    Hostname(String),
}

impl TargetKind {
    /// Number of addresses nmap will walk, when that is knowable up front.
    pub fn host_count(&self) -> Option<u128> {
        match self {
            TargetKind::Address(_) => Some(1),
            TargetKind::Network(IpNet::V4(net)) => {
                Some(1u128 << (32 - u32::from(net.prefix_len())))
            }
            TargetKind::Network(IpNet::V6(net)) => {
                let bits = 128 - u32::from(net.prefix_len());
                if bits >= 128 { None } else { Some(1u128 << bits) }
            }
            TargetKind::Range { start: IpAddr::V4(s), end: IpAddr::V4(e) } => {
                let (s, e) = (u32::from(*s), u32::from(*e));
                (e >= s).then(|| u128::from(e - s) + 1)
            }
            TargetKind::Range { .. } => None,
            TargetKind::Hostname(_) => None,
        }
    }
}

pub fn validate_target(target: &str) -> Result<TargetKind> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ScanError::EmptyTarget);
    }
    if target.chars().count() < 3 {
        return Err(ScanError::TargetTooShort);
    }
    Ok(classify_target(target))
}

fn classify_target(target: &str) -> TargetKind {
    if let Ok(ip) = target.parse::<IpAddr>() {
        return TargetKind::Address(ip);
    }

    if target.contains('/') {
        if let Ok(net) = target.parse::<IpNet>() {
            return TargetKind::Network(net);
        }
    } else if target.contains('-') && !target.contains(':') {
        let parts: Vec<&str> = target.split('-').collect();
        if parts.len() == 2 {
            if let (Ok(start), Ok(end)) = (parts[0].trim().parse(), parts[1].trim().parse()) {
                return TargetKind::Range { start, end };
            }
        }
    }

    TargetKind::Hostname(target.to_string())
}
