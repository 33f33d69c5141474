//! Placeholder path expressions.
//!
//! A placeholder path is a dot-separated walk over the entity relationship
//! graph, optionally wrapped in braces:
//!
//! ```text
//! Name                    Layer 0  direct property (caller-supplied)
//! Town.Name               Layer 1  one navigation hop
//! District.Town.Name      Layer 2  several navigation hops
//! Town.Districts.Count    Layer 3  aggregate over a collection
//! ```
//!
//! A path of depth >= 1 whose final segment is a reserved aggregate operator
//! name is always an aggregate. `Count` on its own (depth 0) is a plain
//! property.

mod parser;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WaymarkError;

pub use parser::{parse, parse_with_max_depth};

/// Aggregate applied to the collection named by the last navigation segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateOperator {
    Count,
    First,
    Last,
    Any,
    Sum,
    Average,
    Max,
    Min,
}

impl AggregateOperator {
    /// All reserved operator names.
    pub const ALL: [AggregateOperator; 8] = [
        AggregateOperator::Count,
        AggregateOperator::First,
        AggregateOperator::Last,
        AggregateOperator::Any,
        AggregateOperator::Sum,
        AggregateOperator::Average,
        AggregateOperator::Max,
        AggregateOperator::Min,
    ];

    /// Match a path segment against the reserved operator names (exact match).
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == segment)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOperator::Count => "Count",
            AggregateOperator::First => "First",
            AggregateOperator::Last => "Last",
            AggregateOperator::Any => "Any",
            AggregateOperator::Sum => "Sum",
            AggregateOperator::Average => "Average",
            AggregateOperator::Max => "Max",
            AggregateOperator::Min => "Min",
        }
    }

    /// Does this operator require numeric elements?
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AggregateOperator::Sum
                | AggregateOperator::Average
                | AggregateOperator::Max
                | AggregateOperator::Min
        )
    }
}

impl fmt::Display for AggregateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution layer of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionLayer {
    /// Layer 0: a value the caller already holds.
    Direct,
    /// Layer 1: a single navigation hop.
    SingleHop,
    /// Layer 2: two or more navigation hops.
    MultiHop,
    /// Layer 3: an aggregate over a collection.
    Aggregate,
}

impl ResolutionLayer {
    pub fn number(&self) -> u8 {
        match self {
            ResolutionLayer::Direct => 0,
            ResolutionLayer::SingleHop => 1,
            ResolutionLayer::MultiHop => 2,
            ResolutionLayer::Aggregate => 3,
        }
    }
}

/// A parsed placeholder path.
///
/// Immutable once parsed. Construct with [`parse`] or `str::parse`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    full_path: String,
    segments: Vec<String>,
    aggregate: Option<AggregateOperator>,
}

impl PathExpression {
    pub(crate) fn from_segments(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty());

        let aggregate = if segments.len() > 1 {
            segments
                .last()
                .and_then(|last| AggregateOperator::from_segment(last))
        } else {
            None
        };

        Self {
            full_path: segments.join("."),
            segments,
            aggregate,
        }
    }

    /// The dot-joined path without braces.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of navigation hops (0 = direct property).
    pub fn depth(&self) -> usize {
        self.segments.len() - 1
    }

    pub fn final_segment(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// All segments but the last.
    pub fn navigation_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregate.is_some()
    }

    pub fn aggregate_operator(&self) -> Option<AggregateOperator> {
        self.aggregate
    }

    pub fn layer(&self) -> ResolutionLayer {
        match (self.depth(), self.aggregate) {
            (0, _) => ResolutionLayer::Direct,
            (_, Some(_)) => ResolutionLayer::Aggregate,
            (1, None) => ResolutionLayer::SingleHop,
            _ => ResolutionLayer::MultiHop,
        }
    }

    /// Every navigation prefix of this path, shortest first.
    ///
    /// `District.Town.Name` yields `District` and `District.Town`.
    pub fn prefetch_chains(&self) -> Vec<String> {
        let navigation = self.navigation_segments();
        (1..=navigation.len())
            .map(|len| navigation[..len].join("."))
            .collect()
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

impl FromStr for PathExpression {
    type Err = WaymarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}
