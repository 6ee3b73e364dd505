//! Workpiece stock dimensions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::Bounds3;

/// Stock geometry supplied by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockGeometry {
    /// Bounding box of the raw stock
    pub bounds: Bounds3,
    /// Stock allowance beyond the part along X
    #[serde(default)]
    pub extent_x: f64,
    /// Stock allowance beyond the part along Y
    #[serde(default)]
    pub extent_y: f64,
}

impl StockGeometry {
    /// Stock geometry without allowances
    pub fn from_bounds(bounds: Bounds3) -> Self {
        Self {
            bounds,
            extent_x: 0.0,
            extent_y: 0.0,
        }
    }
}

/// Where a stock dimension came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionSource {
    /// Set explicitly in the run options
    Configured,
    /// Derived from the stock bounding geometry
    Inferred,
    /// Neither configured nor inferable; left out of the stock block
    Omitted,
}

impl fmt::Display for DimensionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured => write!(f, "configured"),
            Self::Inferred => write!(f, "inferred"),
            Self::Omitted => write!(f, "omitted"),
        }
    }
}

/// One stock dimension together with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Value in mm; `None` only when omitted
    pub value: Option<f64>,
    /// Provenance
    pub source: DimensionSource,
}

impl Dimension {
    /// A configured dimension
    pub fn configured(value: f64) -> Self {
        Self {
            value: Some(value),
            source: DimensionSource::Configured,
        }
    }

    /// An inferred dimension
    pub fn inferred(value: f64) -> Self {
        Self {
            value: Some(value),
            source: DimensionSource::Inferred,
        }
    }

    /// An omitted dimension
    pub fn omitted() -> Self {
        Self {
            value: None,
            source: DimensionSource::Omitted,
        }
    }

    /// Whether the dimension is written to the stock block
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Resolved stock block of one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkpieceStock {
    /// Extent along X
    pub length: Dimension,
    /// Extent along Y
    pub width: Dimension,
    /// Extent along Z
    pub thickness: Dimension,
    /// Stock overhang in front of the part along X (`_FNX`)
    pub extent_x: f64,
    /// Stock overhang in front of the part along Y (`_FNY`)
    pub extent_y: f64,
}

impl WorkpieceStock {
    /// Dimensions with their MPR variable names, in block order
    pub fn named_dimensions(&self) -> [(&'static str, &Dimension); 3] {
        [
            ("length", &self.length),
            ("width", &self.width),
            ("thickness", &self.thickness),
        ]
    }
}

impl Default for WorkpieceStock {
    fn default() -> Self {
        Self {
            length: Dimension::omitted(),
            width: Dimension::omitted(),
            thickness: Dimension::omitted(),
            extent_x: 0.0,
            extent_y: 0.0,
        }
    }
}
