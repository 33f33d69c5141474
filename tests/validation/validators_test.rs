//! Built-in validators across value representations.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use waymark::config::ValidationSettings;
use waymark::store::EntityRecord;
use waymark::validation::{
    FieldValidator, InMemoryRegions, Region, SpatialContainment, SpatialError,
    ValidationContext, ValidatorRegistry,
};
use waymark::value::FieldValue;
use waymark::WaymarkError;

fn regions() -> Arc<InMemoryRegions> {
    Arc::new(
        [
            Region::new("province_7", (-500.0, -500.0), (500.0, 500.0)),
            Region::new("town_4", (0.0, 0.0), (100.0, 100.0)),
            Region::new("town_9", (450.0, 450.0), (600.0, 600.0)),
        ]
        .into_iter()
        .collect(),
    )
}

fn registry() -> ValidatorRegistry {
    ValidatorRegistry::with_builtins(regions())
}

fn ctx() -> ValidationContext {
    ValidationContext::new("{coordinates} is outside {regionName}", "ok")
}

fn town_as_map() -> FieldValue {
    let mut map = BTreeMap::new();
    map.insert("wgregionid".to_string(), json!("town_4"));
    map.insert("NAME".to_string(), json!("Springfield"));
    FieldValue::Map(map)
}

fn town_as_tree() -> FieldValue {
    FieldValue::from_json(json!({"WgRegionId": "town_4", "Name": "Springfield"}))
}

fn town_as_record() -> FieldValue {
    FieldValue::Record(
        EntityRecord::new("Town", 4)
            .with_field("WgRegionId", "town_4")
            .with_field("Name", "Springfield"),
    )
}

// ============================================================================
// LocationInsideRegion
// ============================================================================

#[tokio::test]
async fn test_location_inside_region_any_representation() {
    let registry = registry();
    let config = json!({"regionPath": "WgRegionId", "regionNamePath": "name"});
    let field = FieldValue::text("10, 64, 20");

    for town in [town_as_map(), town_as_tree(), town_as_record()] {
        let outcome = registry
            .validate("LocationInsideRegion", Some(&field), Some(&town), &config, &ctx())
            .await
            .unwrap();
        assert!(outcome.is_valid);
        assert_eq!(outcome.message_template, "ok");
        assert_eq!(outcome.computed_placeholders["coordinates"], "10, 20");
        assert_eq!(outcome.computed_placeholders["regionName"], "Springfield");
    }
}

#[tokio::test]
async fn test_location_outside_region() {
    let registry = registry();
    let config = json!({"regionPath": "WgRegionId"});
    let field = FieldValue::from_json(json!({"x": 250.5, "y": 70, "z": -3}));

    let outcome = registry
        .validate("LocationInsideRegion", Some(&field), Some(&town_as_tree()), &config, &ctx())
        .await
        .unwrap();

    assert!(!outcome.is_valid);
    assert_eq!(outcome.message_template, "{coordinates} is outside {regionName}");
    assert_eq!(outcome.computed_placeholders["coordinates"], "250.5, -3");
    assert_eq!(outcome.computed_placeholders["regionName"], "town_4");
}

#[tokio::test]
async fn test_location_boundary_flag() {
    let registry = registry();
    let field = FieldValue::text("100, 50");
    let town = town_as_tree();

    let strict = registry
        .validate(
            "LocationInsideRegion",
            Some(&field),
            Some(&town),
            &json!({"regionPath": "WgRegionId", "allowBoundary": false}),
            &ctx(),
        )
        .await
        .unwrap();
    assert!(!strict.is_valid);

    let lenient = registry
        .validate(
            "LocationInsideRegion",
            Some(&field),
            Some(&town),
            &json!({"regionPath": "WgRegionId", "allowBoundary": true}),
            &ctx(),
        )
        .await
        .unwrap();
    assert!(lenient.is_valid);

    // Unset in the rule: falls back to the settings default
    let settings = ValidationSettings {
        allow_boundary: true,
        ..ValidationSettings::default()
    };
    let from_settings = registry
        .validate(
            "LocationInsideRegion",
            Some(&field),
            Some(&town),
            &json!({"regionPath": "WgRegionId"}),
            &ctx().with_settings(settings),
        )
        .await
        .unwrap();
    assert!(from_settings.is_valid);
}

#[tokio::test]
async fn test_location_missing_values() {
    let registry = registry();
    let config = json!({"regionPath": "WgRegionId"});
    let field = FieldValue::text("1, 2");

    let no_dependency = registry
        .validate("LocationInsideRegion", Some(&field), None, &config, &ctx())
        .await
        .unwrap();
    assert!(!no_dependency.is_valid);
    assert_eq!(
        no_dependency.metadata_value("failure"),
        Some(&json!("dependencyMissing"))
    );

    let null_field = FieldValue::Scalar(Value::Null);
    let no_field = registry
        .validate("LocationInsideRegion", Some(&null_field), Some(&town_as_tree()), &config, &ctx())
        .await
        .unwrap();
    assert_eq!(no_field.metadata_value("failure"), Some(&json!("dependencyMissing")));
}

struct BrokenSpatial;

#[async_trait]
impl SpatialContainment for BrokenSpatial {
    async fn point_in_region(&self, _: &str, _: f64, _: f64, _: bool) -> Result<bool, SpatialError> {
        Err(SpatialError::Backend("region service down".to_string()))
    }

    async fn region_contained(&self, _: &str, _: &str, _: bool) -> Result<bool, SpatialError> {
        Err(SpatialError::Backend("region service down".to_string()))
    }
}

#[tokio::test]
async fn test_spatial_failure_fails_the_rule() {
    let registry = ValidatorRegistry::with_builtins(Arc::new(BrokenSpatial));
    let outcome = registry
        .validate(
            "LocationInsideRegion",
            Some(&FieldValue::text("1, 2")),
            Some(&town_as_tree()),
            &json!({"regionPath": "WgRegionId"}),
            &ctx(),
        )
        .await
        .unwrap();

    assert!(!outcome.is_valid);
    assert_eq!(outcome.metadata_value("failure"), Some(&json!("spatialError")));
    assert_eq!(outcome.computed_placeholders["coordinates"], "1, 2");
}

// ============================================================================
// RegionContainment
// ============================================================================

#[tokio::test]
async fn test_region_containment() {
    let registry = registry();
    let config = json!({
        "childRegionPath": "WgRegionId",
        "parentRegionPath": "WgRegionId",
        "parentNamePath": "Name"
    });
    let province = FieldValue::from_json(json!({"wgRegionId": "province_7", "name": "Green Valley"}));

    let inside = registry
        .validate("RegionContainment", Some(&town_as_record()), Some(&province), &config, &ctx())
        .await
        .unwrap();
    assert!(inside.is_valid);
    assert_eq!(inside.computed_placeholders["parentName"], "Green Valley");
    assert_eq!(inside.computed_placeholders["childRegion"], "town_4");

    let straddling = FieldValue::from_json(json!({"WgRegionId": "town_9"}));
    let full = registry
        .validate("RegionContainment", Some(&straddling), Some(&province), &config, &ctx())
        .await
        .unwrap();
    assert!(!full.is_valid);

    let mut partial_config = config.clone();
    partial_config["requireFull"] = json!(false);
    let partial = registry
        .validate("RegionContainment", Some(&straddling), Some(&province), &partial_config, &ctx())
        .await
        .unwrap();
    assert!(partial.is_valid);
}

#[tokio::test]
async fn test_region_containment_unknown_region() {
    let registry = registry();
    let outcome = registry
        .validate(
            "RegionContainment",
            Some(&FieldValue::from_json(json!({"RegionId": "nowhere"}))),
            Some(&FieldValue::from_json(json!({"RegionId": "province_7"}))),
            &Value::Null,
            &ctx(),
        )
        .await
        .unwrap();

    assert!(!outcome.is_valid);
    assert_eq!(outcome.metadata_value("failure"), Some(&json!("spatialError")));
}

// ============================================================================
// ConditionalRequired
// ============================================================================

#[tokio::test]
async fn test_conditional_required_equals() {
    let registry = registry();
    let config = json!({"operator": "equals", "value": "complex"});
    let empty = FieldValue::text("");

    let required = registry
        .validate(
            "ConditionalRequired",
            Some(&empty),
            Some(&FieldValue::text("complex")),
            &config,
            &ctx(),
        )
        .await
        .unwrap();
    assert!(!required.is_valid);
    assert_eq!(required.computed_placeholders["dependencyValue"], "complex");
    assert_eq!(required.computed_placeholders["expectedValue"], "complex");

    for field in [FieldValue::text(""), FieldValue::text("anything")] {
        let outcome = registry
            .validate(
                "ConditionalRequired",
                Some(&field),
                Some(&FieldValue::text("simple")),
                &config,
                &ctx(),
            )
            .await
            .unwrap();
        assert!(outcome.is_valid);
    }
}

#[tokio::test]
async fn test_conditional_required_dependency_path() {
    let registry = registry();
    let config = json!({"operator": "equals", "value": "complex", "dependencyPath": "kind"});
    let town = FieldValue::Record(EntityRecord::new("Town", 4).with_field("Kind", "Complex"));

    let outcome = registry
        .validate("ConditionalRequired", None, Some(&town), &config, &ctx())
        .await
        .unwrap();
    assert!(!outcome.is_valid);
    assert_eq!(outcome.metadata_value("failure"), Some(&json!("required")));
}

#[tokio::test]
async fn test_conditional_required_path_into_collection() {
    let registry = registry();
    let config = json!({"operator": "equals", "value": "complex", "dependencyPath": "Districts.0.Kind"});

    let record = FieldValue::Record(EntityRecord::new("Town", 4).with_collection(
        "Districts",
        vec![EntityRecord::new("District", 1)
            .with_field("Name", "North")
            .with_field("Kind", "complex")],
    ));
    let tree = FieldValue::from_json(json!({"Districts": [{"Id": 1, "Name": "North", "Kind": "complex"}]}));
    let mut flat = BTreeMap::new();
    flat.insert("districts".to_string(), json!([{"kind": "COMPLEX"}]));
    let map = FieldValue::Map(flat);

    for dependency in [record, tree, map] {
        let outcome = registry
            .validate(
                "ConditionalRequired",
                Some(&FieldValue::text("")),
                Some(&dependency),
                &config,
                &ctx(),
            )
            .await
            .unwrap();
        assert!(!outcome.is_valid, "{:?}", dependency);
        assert_eq!(outcome.metadata_value("failure"), Some(&json!("required")));
    }
}

#[tokio::test]
async fn test_conditional_required_zero_is_configurable() {
    let registry = registry();
    let zero = FieldValue::Scalar(json!(0));
    let dependency = FieldValue::Scalar(json!(10));

    let zero_empty = registry
        .validate(
            "ConditionalRequired",
            Some(&zero),
            Some(&dependency),
            &json!({"operator": "greaterThan", "value": 5, "zeroIsEmpty": true}),
            &ctx(),
        )
        .await
        .unwrap();
    assert!(!zero_empty.is_valid);

    let zero_filled = registry
        .validate(
            "ConditionalRequired",
            Some(&zero),
            Some(&dependency),
            &json!({"operator": "greaterThan", "value": 5, "zeroIsEmpty": false}),
            &ctx(),
        )
        .await
        .unwrap();
    assert!(zero_filled.is_valid);
}

#[tokio::test]
async fn test_conditional_required_in_operator() {
    let registry = registry();
    let config = json!({"operator": "in", "value": ["market", "harbor"]});

    let outcome = registry
        .validate(
            "ConditionalRequired",
            Some(&FieldValue::text("  ")),
            Some(&FieldValue::text("Harbor")),
            &config,
            &ctx(),
        )
        .await
        .unwrap();
    assert!(!outcome.is_valid);
    assert_eq!(outcome.computed_placeholders["expectedValue"], "market, harbor");
}

#[tokio::test]
async fn test_conditional_required_bad_operator() {
    let registry = registry();
    let err = registry
        .validate(
            "ConditionalRequired",
            None,
            None,
            &json!({"operator": "between"}),
            &ctx(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WaymarkError::InvalidConfiguration { ref validation_type, .. } if validation_type == "ConditionalRequired"
    ));
}

#[tokio::test]
async fn test_custom_validator_registration() {
    struct NonEmpty;

    #[async_trait]
    impl FieldValidator for NonEmpty {
        fn validation_type(&self) -> &str {
            "NonEmpty"
        }

        async fn validate(
            &self,
            field: Option<&FieldValue>,
            _dependency: Option<&FieldValue>,
            _configuration: &Value,
            ctx: &ValidationContext,
        ) -> waymark::Result<waymark::validation::ValidatorOutcome> {
            Ok(ctx.outcome(field.is_some_and(|f| !f.is_empty(false))))
        }
    }

    let mut registry = registry();
    registry.register(NonEmpty);
    assert!(registry.contains("NonEmpty"));

    let outcome = registry
        .validate("NonEmpty", Some(&FieldValue::text("x")), None, &Value::Null, &ctx())
        .await
        .unwrap();
    assert!(outcome.is_valid);
}
