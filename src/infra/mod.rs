// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   checkpoint.rs - saving and loading circuit weights with Burn's
//                   file recorder, the latest-epoch pointer and
//                   the run config as JSON
//
//   baseline.rs   - reading the comparison classifier's scores
//
//   metrics.rs    - CSV tables of per-epoch metrics and ROC points
//
//   plot.rs       - SVG line charts
//
//   report.rs     - names and writes the per-run artifacts

/// Weight snapshots and run config
pub mod checkpoint;

/// Baseline classifier scores
pub mod baseline;

/// CSV tables
pub mod metrics;

/// SVG charts
pub mod plot;

/// Artifact naming and writing
pub mod report;
