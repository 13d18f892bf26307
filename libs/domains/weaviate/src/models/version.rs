use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WeaviateError;

/// Server version from `/v1/meta`, pre-release suffixes dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Per-name tenant lookup endpoint
    pub fn supports_tenant_lookup(&self) -> bool {
        *self >= ServerVersion::new(1, 25, 0)
    }

    /// Backup `CPUPercentage` config
    pub fn supports_backup_cpu_limit(&self) -> bool {
        *self > ServerVersion::new(1, 25, 0)
    }
}

impl FromStr for ServerVersion {
    type Err = WeaviateError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let core = raw
            .trim()
            .trim_start_matches('v')
            .split(['-', '+'])
            .next()
            .unwrap_or_default();
        let mut parts = core.split('.').map(|part| part.parse::<u32>());
        let invalid = || WeaviateError::Validation(format!("invalid server version '{raw}'"));

        let major = parts.next().ok_or_else(invalid)?.map_err(|_| invalid())?;
        let minor = parts.next().unwrap_or(Ok(0)).map_err(|_| invalid())?;
        let patch = parts.next().unwrap_or(Ok(0)).map_err(|_| invalid())?;
        Ok(ServerVersion::new(major, minor, patch))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
