//! Lifecycle configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How replacing an order's item set affects stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemReplacement {
    /// Reserve or release only the per-product difference between what the
    /// order held before and what it holds after.
    #[default]
    NetDelta,

    /// Reserve the whole new item set whenever the item identities change,
    /// on top of whatever the old items still hold.
    ReserveNew,
}

impl FromStr for ItemReplacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "net-delta" | "net_delta" => Ok(ItemReplacement::NetDelta),
            "reserve-new" | "reserve_new" => Ok(ItemReplacement::ReserveNew),
            other => Err(format!(
                "unknown item replacement policy '{other}' (expected net-delta or reserve-new)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Extra attempts after an optimistic concurrency conflict.
    pub max_retries: u32,
    pub item_replacement: ItemReplacement,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            item_replacement: ItemReplacement::NetDelta,
        }
    }
}
