// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers for one run of the classifier.
//
// Rules for this layer:
//   - No tensor math here (that's Layer 5)
//   - No direct file formats here (that's Layer 4 and 6)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

/// Train or evaluate, then report
pub mod run_use_case;
