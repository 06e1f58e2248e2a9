//! Query scope and projection flags for crop stage listings

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which slice of the dataset a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every record visible to the user
    All,
    /// Records of a single farm
    Farm(u64),
}

impl Scope {
    pub fn from_farm(farm_id: Option<u64>) -> Self {
        farm_id.map_or(Scope::All, Scope::Farm)
    }

    /// Collection path relative to the API base URL.
    pub fn collection_path(&self) -> String {
        match self {
            Scope::All => "/farms/crop-stages/".to_string(),
            Scope::Farm(farm_id) => format!("/farms/{}/crop-stages/", farm_id),
        }
    }

    /// Single-record path relative to the API base URL.
    pub fn record_path(&self, record_id: u64) -> String {
        format!("{}{}/", self.collection_path(), record_id)
    }

    pub fn farm_id(&self) -> Option<u64> {
        match self {
            Scope::All => None,
            Scope::Farm(farm_id) => Some(*farm_id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all"),
            Scope::Farm(farm_id) => write!(f, "farm:{}", farm_id),
        }
    }
}

/// Optional projections requested from the listing endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFlags {
    pub history: bool,
    pub analytics: bool,
    pub timeline: bool,
}

impl ListFlags {
    pub fn history() -> Self {
        Self {
            history: true,
            ..Self::default()
        }
    }

    pub fn analytics() -> Self {
        Self {
            history: true,
            analytics: true,
            ..Self::default()
        }
    }

    /// Query parameters for the enabled flags.
    pub fn query_params(&self) -> Vec<(&'static str, &'static str)> {
        let mut params = vec![];
        if self.history {
            params.push(("history", "true"));
        }
        if self.analytics {
            params.push(("analytics", "true"));
        }
        if self.timeline {
            params.push(("timeline", "true"));
        }
        params
    }
}
