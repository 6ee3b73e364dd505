//! Workpiece dimension inference

use mprkit_core::{Dimension, StockGeometry, WorkpieceStock};
use mprkit_settings::PostOptions;

fn resolve(configured: Option<f64>, measured: Option<f64>, axis: &str) -> Dimension {
    if let Some(value) = configured {
        return Dimension::configured(value);
    }
    match measured {
        Some(value) if value > 0.0 => {
            tracing::debug!("{} inferred from stock geometry: {:.3}", axis, value);
            Dimension::inferred(value)
        }
        _ => {
            tracing::debug!("{} omitted: not configured and no stock extent", axis);
            Dimension::omitted()
        }
    }
}

/// Resolve the stock block from the options and the host's stock geometry.
///
/// Configured values win. Missing values come from the stock bounding box
/// along the matching axis; without geometry or with a non-positive extent the
/// dimension is omitted rather than zeroed.
pub fn infer_stock(options: &PostOptions, stock: Option<&StockGeometry>) -> WorkpieceStock {
    let bounds = stock.map(|s| s.bounds);

    WorkpieceStock {
        length: resolve(options.workpiece_length, bounds.map(|b| b.size_x()), "length"),
        width: resolve(options.workpiece_width, bounds.map(|b| b.size_y()), "width"),
        thickness: resolve(
            options.workpiece_thickness,
            bounds.map(|b| b.size_z()),
            "thickness",
        ),
        extent_x: stock.map(|s| s.extent_x).unwrap_or(0.0),
        extent_y: stock.map(|s| s.extent_y).unwrap_or(0.0),
    }
}
