use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Tenant activity status as reported by the server.
///
/// Newer servers report `ACTIVE`/`INACTIVE`/`OFFLOADED`, older ones
/// `HOT`/`COLD`/`FROZEN`. Each pair names the same state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum TenantActivityStatus {
    Hot,
    #[default]
    Active,
    Cold,
    Inactive,
    Frozen,
    Offloaded,
}

impl TenantActivityStatus {
    /// Collapse legacy names onto `Active`, `Inactive` or `Offloaded`.
    pub fn canonical(self) -> Self {
        match self {
            Self::Hot | Self::Active => Self::Active,
            Self::Cold | Self::Inactive => Self::Inactive,
            Self::Frozen | Self::Offloaded => Self::Offloaded,
        }
    }

    pub fn is_equivalent(self, other: Self) -> bool {
        self.canonical() == other.canonical()
    }

    /// Loaded and queryable.
    pub fn is_available(self) -> bool {
        self.canonical() == Self::Active
    }

    pub fn is_paused(self) -> bool {
        self.canonical() == Self::Inactive
    }

    pub fn is_archived(self) -> bool {
        self.canonical() == Self::Offloaded
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub name: String,
    #[serde(default)]
    pub activity_status: TenantActivityStatus,
}

impl Tenant {
    pub fn new(name: impl Into<String>, activity_status: TenantActivityStatus) -> Self {
        Self {
            name: name.into(),
            activity_status,
        }
    }
}

/// Which slice of a collection an operation addresses.
///
/// `Unscoped` stands for a collection without multi-tenancy and is treated
/// like any other member of a resolved tenant list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TenantScope {
    Unscoped,
    Tenant(String),
}

impl TenantScope {
    pub fn tenant(name: impl Into<String>) -> Self {
        TenantScope::Tenant(name.into())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            TenantScope::Unscoped => None,
            TenantScope::Tenant(name) => Some(name),
        }
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantScope::Unscoped => f.write_str("<none>"),
            TenantScope::Tenant(name) => f.write_str(name),
        }
    }
}

/// A collection handle bound to one tenant scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedCollection {
    pub collection: String,
    pub scope: TenantScope,
}

impl ScopedCollection {
    pub fn new(collection: impl Into<String>, scope: TenantScope) -> Self {
        Self {
            collection: collection.into(),
            scope,
        }
    }

    pub fn unscoped(collection: impl Into<String>) -> Self {
        Self::new(collection, TenantScope::Unscoped)
    }

    pub fn tenant(&self) -> Option<&str> {
        self.scope.name()
    }
}

impl fmt::Display for ScopedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            TenantScope::Unscoped => write!(f, "collection {}", self.collection),
            TenantScope::Tenant(name) => {
                write!(f, "tenant {} of collection {}", name, self.collection)
            }
        }
    }
}
