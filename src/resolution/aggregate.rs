//! Collection aggregates for Layer 3 paths.

use serde_json::Value;

use super::types::ResolutionErrorKind;
use crate::path::AggregateOperator;
use crate::store::EntityRecord;
use crate::value::{format_number, json_as_f64, render_scalar};

/// One element of the collection being aggregated.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Element<'a> {
    /// A related entity from a collection navigation.
    Entity(&'a EntityRecord),
    /// A value from a scalar collection property.
    Value(&'a Value),
}

impl Element<'_> {
    fn render(&self) -> String {
        match self {
            Element::Entity(record) => record.id.to_string(),
            Element::Value(value) => render_scalar(value).unwrap_or_default(),
        }
    }
}

/// Why an aggregate could not be computed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AggregateFailure {
    pub kind: ResolutionErrorKind,
    pub detail: String,
}

impl AggregateFailure {
    fn empty(op: AggregateOperator) -> Self {
        Self {
            kind: ResolutionErrorKind::AggregateEmpty,
            detail: format!("{} over an empty collection", op),
        }
    }

    fn mismatch(op: AggregateOperator, detail: impl Into<String>) -> Self {
        Self {
            kind: ResolutionErrorKind::AggregateTypeMismatch,
            detail: format!("{} requires numeric elements: {}", op, detail.into()),
        }
    }
}

/// Apply `op` to `elements` in their enumeration order.
pub(crate) fn apply(op: AggregateOperator, elements: &[Element<'_>]) -> Result<String, AggregateFailure> {
    match op {
        AggregateOperator::Count => Ok(elements.len().to_string()),
        AggregateOperator::Any => Ok((!elements.is_empty()).to_string()),
        AggregateOperator::First => elements
            .first()
            .map(Element::render)
            .ok_or_else(|| AggregateFailure::empty(op)),
        AggregateOperator::Last => elements
            .last()
            .map(Element::render)
            .ok_or_else(|| AggregateFailure::empty(op)),
        AggregateOperator::Sum
        | AggregateOperator::Average
        | AggregateOperator::Max
        | AggregateOperator::Min => numeric(op, elements),
    }
}

/// A numeric element. Integers stay exact until a float forces `f64`.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .map(Number::Int)
                .or_else(|| n.as_f64().map(Number::Float)),
            Value::String(s) => match s.trim().parse::<i128>() {
                Ok(n) => Some(Number::Int(n)),
                Err(_) => json_as_f64(value).map(Number::Float),
            },
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }
}

fn numeric(op: AggregateOperator, elements: &[Element<'_>]) -> Result<String, AggregateFailure> {
    let mut numbers = Vec::with_capacity(elements.len());

    for element in elements {
        match element {
            Element::Entity(record) => {
                return Err(AggregateFailure::mismatch(
                    op,
                    format!("'{}' entities are not numeric", record.entity_type),
                ));
            }
            // Null elements carry no value and are skipped
            Element::Value(Value::Null) => {}
            Element::Value(value) => match Number::from_json(value) {
                Some(n) => numbers.push(n),
                None => {
                    return Err(AggregateFailure::mismatch(
                        op,
                        format!("{} is not numeric", value),
                    ));
                }
            },
        }
    }

    if numbers.is_empty() {
        return match op {
            AggregateOperator::Sum => Ok("0".to_string()),
            _ => Err(AggregateFailure::empty(op)),
        };
    }

    let integers: Option<Vec<i128>> = numbers
        .iter()
        .map(|n| match n {
            Number::Int(i) => Some(*i),
            Number::Float(_) => None,
        })
        .collect();

    if let Some(integers) = integers {
        if let Some(result) = integer_aggregate(op, &integers) {
            return Ok(result);
        }
    }

    let floats: Vec<f64> = numbers.into_iter().map(Number::as_f64).collect();
    let result = match op {
        AggregateOperator::Sum => floats.iter().sum(),
        AggregateOperator::Average => floats.iter().sum::<f64>() / floats.len() as f64,
        AggregateOperator::Max => floats.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        _ => floats.iter().copied().fold(f64::INFINITY, f64::min),
    };

    Ok(format_number(result))
}

/// Exact result over integers; `None` on overflow or an inexact average.
fn integer_aggregate(op: AggregateOperator, integers: &[i128]) -> Option<String> {
    let sum = || {
        integers
            .iter()
            .try_fold(0i128, |acc, n| acc.checked_add(*n))
    };

    let result = match op {
        AggregateOperator::Sum => sum()?,
        AggregateOperator::Average => {
            let total = sum()?;
            let count = integers.len() as i128;
            if total % count != 0 {
                return None;
            }
            total / count
        }
        AggregateOperator::Max => *integers.iter().max()?,
        _ => *integers.iter().min()?,
    };
    Some(result.to_string())
}
