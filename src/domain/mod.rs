// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits describing jets, datasets and the
// failures the pipeline can report.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// Typed errors raised by the core pipeline
pub mod error;

// A row-aligned set of jet feature vectors and labels
pub mod jet;

// Core abstractions (traits) that other layers implement
pub mod traits;
