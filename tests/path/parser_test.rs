//! Path parsing and classification.

use proptest::prelude::*;
use waymark::path::{parse, parse_with_max_depth, AggregateOperator, PathExpression, ResolutionLayer};
use waymark::WaymarkError;

fn reason(raw: &str) -> String {
    match parse(raw) {
        Err(WaymarkError::MalformedPath { reason, .. }) => reason,
        other => panic!("expected MalformedPath for {:?}, got {:?}", raw, other),
    }
}

#[test]
fn test_layers() {
    let cases = [
        ("Name", ResolutionLayer::Direct, 0),
        ("Town.Name", ResolutionLayer::SingleHop, 1),
        ("Town.Province.Name", ResolutionLayer::MultiHop, 2),
        ("Town.Districts.Count", ResolutionLayer::Aggregate, 2),
        ("Tags.First", ResolutionLayer::Aggregate, 1),
    ];

    for (raw, layer, depth) in cases {
        let path = parse(raw).unwrap();
        assert_eq!(path.layer(), layer, "{}", raw);
        assert_eq!(path.depth(), depth, "{}", raw);
    }
}

#[test]
fn test_layer_numbers() {
    assert_eq!(parse("Name").unwrap().layer().number(), 0);
    assert_eq!(parse("Town.Name").unwrap().layer().number(), 1);
    assert_eq!(parse("Town.Province.Name").unwrap().layer().number(), 2);
    assert_eq!(parse("Districts.Count").unwrap().layer().number(), 3);
}

#[test]
fn test_aggregate_classification() {
    let path = parse("Town.Districts.Sum").unwrap();
    assert_eq!(path.aggregate_operator(), Some(AggregateOperator::Sum));
    assert_eq!(path.final_segment(), "Sum");
    assert_eq!(path.navigation_segments(), ["Town", "Districts"]);

    // Operator names are reserved only in final position of a multi-segment path
    let lone = parse("Count").unwrap();
    assert_eq!(lone.depth(), 0);
    assert!(!lone.is_aggregate());
    assert_eq!(lone.layer(), ResolutionLayer::Direct);

    let middle = parse("Town.Count.Name").unwrap();
    assert!(!middle.is_aggregate());

    // Exact match only
    let lower = parse("Town.Districts.count").unwrap();
    assert!(!lower.is_aggregate());
    assert_eq!(lower.layer(), ResolutionLayer::MultiHop);
}

#[test]
fn test_every_operator_is_recognised() {
    for op in AggregateOperator::ALL {
        let path = parse(&format!("Districts.{}", op)).unwrap();
        assert_eq!(path.aggregate_operator(), Some(op));
    }
}

#[test]
fn test_braces_and_whitespace() {
    for raw in ["Town.Name", "{Town.Name}", "  {Town.Name}  ", "\t{Town.Name}\n"] {
        assert_eq!(parse(raw).unwrap().full_path(), "Town.Name", "{:?}", raw);
    }
    assert_eq!(reason("{Town.Name"), "unbalanced braces");
    assert_eq!(reason("Town.Name}"), "unbalanced braces");
    assert_eq!(reason("{}"), "path is empty");
    // Only whitespace around the braces is ignored
    assert_eq!(reason("{ Town.Name }"), "invalid character ' '");
    assert_eq!(reason("{\tName}"), "invalid character '\t'");
}

#[test]
fn test_malformed_paths() {
    assert_eq!(reason(""), "path is empty");
    assert_eq!(reason("   "), "path is empty");
    assert_eq!(reason("Town..Name"), "empty path segment");
    assert_eq!(reason(".Name"), "empty path segment");
    assert_eq!(reason("Town."), "empty path segment");
    assert_eq!(reason("Town Name"), "invalid character ' '");
    assert_eq!(reason("Town-Name"), "invalid character '-'");
    assert_eq!(reason("Town.2nd"), "segment '2nd' starts with a digit");
}

#[test]
fn test_malformed_error_keeps_input() {
    let err = parse("{Town..Name}").unwrap_err();
    assert!(matches!(
        err,
        WaymarkError::MalformedPath { ref input, .. } if input == "{Town..Name}"
    ));
}

#[test]
fn test_max_depth() {
    assert!(parse_with_max_depth("A.B.C", 2).is_ok());
    match parse_with_max_depth("A.B.C.D", 2) {
        Err(WaymarkError::MalformedPath { reason, .. }) => {
            assert_eq!(reason, "depth 3 exceeds the maximum of 2")
        }
        other => panic!("expected depth failure, got {:?}", other),
    }
}

#[test]
fn test_prefetch_chains() {
    let path = parse("Town.Province.Name").unwrap();
    assert_eq!(path.prefetch_chains(), ["Town", "Town.Province"]);
    assert!(parse("Name").unwrap().prefetch_chains().is_empty());
}

#[test]
fn test_from_str() {
    let path: PathExpression = "{Town.Name}".parse().unwrap();
    assert_eq!(path.to_string(), "Town.Name");
}

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,8}"
}

fn segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment(), 1..6)
}

proptest! {
    #[test]
    fn prop_well_formed_paths_round_trip(segs in segments(), braced in any::<bool>()) {
        let joined = segs.join(".");
        let raw = if braced { format!("{{{}}}", joined) } else { joined.clone() };

        let path = parse(&raw).unwrap();
        prop_assert_eq!(path.full_path(), joined.as_str());
        prop_assert_eq!(path.segments(), segs.as_slice());
        prop_assert_eq!(path.depth(), segs.len() - 1);
        prop_assert_eq!(path.prefetch_chains().len(), segs.len() - 1);
    }

    #[test]
    fn prop_depth_limit_is_exact(segs in segments(), max in 0usize..6) {
        let result = parse_with_max_depth(&segs.join("."), max);
        prop_assert_eq!(result.is_ok(), segs.len() - 1 <= max);
    }

    #[test]
    fn prop_parser_never_panics(raw in "\\PC{0,24}") {
        let _ = parse(&raw);
    }
}
