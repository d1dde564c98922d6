//! Rollup hierarchy layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One granularity level of the summary hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Layers that are produced by rolling up a child layer, children first.
pub const ROLLUP_LAYERS: [Layer; 3] = [Layer::Weekly, Layer::Monthly, Layer::Yearly];

impl Layer {
    /// The layer whose summaries feed this one. Daily is the base layer.
    pub fn child(&self) -> Option<Layer> {
        match self {
            Self::Daily => None,
            Self::Weekly => Some(Self::Daily),
            Self::Monthly => Some(Self::Weekly),
            Self::Yearly => Some(Self::Monthly),
        }
    }

    /// The layer that consumes this one.
    pub fn parent(&self) -> Option<Layer> {
        match self {
            Self::Daily => Some(Self::Weekly),
            Self::Weekly => Some(Self::Monthly),
            Self::Monthly => Some(Self::Yearly),
            Self::Yearly => None,
        }
    }

    /// Returns the child layer or a `LAYER_001` error for the base layer.
    pub fn require_child(&self) -> Result<Layer, Error> {
        self.child().ok_or_else(|| {
            Error::invalid_layer(format!("{} layer has no child layer to roll up", self))
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(Error::invalid_layer(format!("unknown layer: {}", other))),
        }
    }
}
