//! Placeholder resolution.
//!
//! ```text
//!   template ──► extract_placeholders ──► ResolutionRequest
//!                                               │
//!                                      PlaceholderResolver
//!                                      │                 │
//!                        Layer 0 (known values)   Layers 1-3
//!                                                        │
//!                                            PathResolutionEngine
//!                                            (one fetch per root)
//! ```
//!
//! Layers:
//! - 0: direct property, supplied by the caller (`Name`)
//! - 1: single navigation (`Town.Name`)
//! - 2: multi-hop navigation (`Town.Region.Name`)
//! - 3: collection aggregate (`Town.Districts.Count`)

mod aggregate;
mod engine;
mod orchestrator;
mod template;
mod types;

pub use engine::PathResolutionEngine;
pub use orchestrator::PlaceholderResolver;
pub use template::{extract_placeholders, interpolate};
pub use types::{
    KnownValues, ResolutionError, ResolutionErrorKind, ResolutionRequest, ResolutionResult,
};
