//! Field validation service: dispatch plus placeholder gathering.

use std::sync::Arc;

use serde_json::json;
use waymark::metadata::InMemoryMetadataRegistry;
use waymark::resolution::{KnownValues, PlaceholderResolver, ResolutionErrorKind};
use waymark::snapshot::Snapshot;
use waymark::store::{EntityId, InMemoryEntityStore};
use waymark::validation::{FieldValidationService, ValidationRule, ValidatorRegistry};
use waymark::value::FieldValue;
use waymark::WaymarkError;

type Service = FieldValidationService<InMemoryMetadataRegistry, InMemoryEntityStore>;

fn service() -> Service {
    let parts = Snapshot::from_json(include_str!("../fixtures/springfield.json"))
        .unwrap()
        .into_parts();
    let resolver = PlaceholderResolver::new(Arc::new(parts.registry), Arc::new(parts.store));
    FieldValidationService::new(resolver, ValidatorRegistry::with_builtins(Arc::new(parts.regions)))
}

fn fetches(service: &Service) -> usize {
    service.resolver().engine().store().fetch_count()
}

fn district() -> EntityId {
    EntityId::from(1)
}

fn springfield() -> FieldValue {
    FieldValue::from_json(json!({"WgRegionId": "town_4", "Name": "Springfield", "Kind": "complex"}))
}

fn spawn_rule() -> ValidationRule {
    ValidationRule::new(1, "District", "LocationInsideRegion")
        .with_configuration(json!({"regionPath": "WgRegionId", "regionNamePath": "Name"}))
        .with_error_message("Spawn {coordinates} is outside {Town.Name} ({regionName})")
        .with_success_message("Spawn is inside {Town.Name}")
}

fn required_rule(id: i64) -> ValidationRule {
    ValidationRule::new(id, "District", "ConditionalRequired")
        .with_configuration(json!({"operator": "equals", "value": "complex", "dependencyPath": "Kind"}))
        .with_error_message("{Name} needs a value in {Town.Name}")
        .with_success_message("ok")
}

#[tokio::test]
async fn test_failed_rule_gathers_navigation_and_computed_placeholders() {
    let service = service();
    let field = FieldValue::text("150, 20");

    let result = service
        .validate(&spawn_rule(), Some(&field), Some(&springfield()), &KnownValues::new(), &district())
        .await
        .unwrap();

    assert!(!result.is_valid());
    // The template comes back uninterpolated
    assert_eq!(
        result.message_template(),
        "Spawn {coordinates} is outside {Town.Name} ({regionName})"
    );
    assert_eq!(result.placeholders["Town.Name"], "Springfield");
    assert_eq!(result.placeholders["coordinates"], "150, 20");
    assert_eq!(result.placeholders["regionName"], "Springfield");
    assert!(result.resolution_errors.is_empty());
    assert_eq!(
        result.render().unwrap(),
        "Spawn 150, 20 is outside Springfield (Springfield)"
    );
    assert_eq!(fetches(&service), 1);
}

#[tokio::test]
async fn test_passing_rule_uses_success_template() {
    let service = service();
    let field = FieldValue::text("10, 64, 20");

    let result = service
        .validate(&spawn_rule(), Some(&field), Some(&springfield()), &KnownValues::new(), &district())
        .await
        .unwrap();

    assert!(result.is_valid());
    assert_eq!(result.render().unwrap(), "Spawn is inside Springfield");
}

#[tokio::test]
async fn test_computed_placeholders_win_over_known_values() {
    let service = service();
    let mut known = KnownValues::new();
    known.insert("regionName".to_string(), "stale".to_string());

    let result = service
        .validate(
            &spawn_rule(),
            Some(&FieldValue::text("150, 20")),
            Some(&springfield()),
            &known,
            &district(),
        )
        .await
        .unwrap();

    assert_eq!(result.placeholders["regionName"], "Springfield");
}

#[tokio::test]
async fn test_unresolved_placeholders_are_reported() {
    let service = service();
    let rule = ValidationRule::new(2, "District", "ConditionalRequired")
        .with_configuration(json!({"operator": "equals", "value": "complex", "dependencyPath": "Kind"}))
        .with_error_message("Ask {Town.Mayor.Name} about {Name}");

    let result = service
        .validate(&rule, None, Some(&springfield()), &KnownValues::new(), &district())
        .await
        .unwrap();

    assert!(!result.is_valid());
    let kinds: Vec<_> = result
        .resolution_errors
        .iter()
        .map(|e| (e.path.as_str(), e.kind))
        .collect();
    assert!(kinds.contains(&("Town.Mayor.Name", ResolutionErrorKind::DependencyNotFilled)));
    assert!(kinds.contains(&("Name", ResolutionErrorKind::DependencyNotFilled)));
    assert!(matches!(
        result.render(),
        Err(WaymarkError::UnresolvedPlaceholders(_))
    ));
}

#[tokio::test]
async fn test_unknown_validation_type_fails_before_resolution() {
    let service = service();
    let rule = ValidationRule::new(3, "District", "MustBePrime").with_error_message("{Town.Name}");

    let err = service
        .validate(&rule, None, None, &KnownValues::new(), &district())
        .await
        .unwrap_err();

    assert!(matches!(err, WaymarkError::UnknownValidationType(ref t) if t == "MustBePrime"));
    assert_eq!(fetches(&service), 0);
}

#[tokio::test]
async fn test_templates_without_placeholders_skip_the_store() {
    let service = service();
    let rule = ValidationRule::new(4, "District", "ConditionalRequired")
        .with_configuration(json!({"value": "complex", "dependencyPath": "Kind"}))
        .with_error_message("required")
        .with_success_message("ok");

    let result = service
        .validate(&rule, Some(&FieldValue::text("x")), Some(&springfield()), &KnownValues::new(), &district())
        .await
        .unwrap();

    assert!(result.is_valid());
    assert!(result.placeholders.contains_key("dependencyValue"));
    assert_eq!(fetches(&service), 0);
}

#[tokio::test]
async fn test_unfilled_dependency_skips_validator() {
    let service = service();
    let rule = required_rule(5).requires_dependency(true);
    let mut known = KnownValues::new();
    known.insert("Name".to_string(), "North".to_string());

    for dependency in [None, Some(FieldValue::text("  "))] {
        let result = service
            .validate(&rule, None, dependency.as_ref(), &known, &district())
            .await
            .unwrap();

        assert!(result.is_valid());
        assert_eq!(result.message_template(), "ok");
        assert_eq!(
            result.outcome.metadata_value("skipped"),
            Some(&json!("dependencyNotFilled"))
        );
    }

    // A filled dependency runs the validator
    let result = service
        .validate(&rule, None, Some(&springfield()), &known, &district())
        .await
        .unwrap();
    assert!(!result.is_valid());
    assert_eq!(result.render().unwrap(), "North needs a value in Springfield");
}

#[tokio::test]
async fn test_validate_all_stops_at_blocking_failure() {
    let service = service();
    let known = KnownValues::new();

    let rules = vec![required_rule(10).blocking(true), spawn_rule()];
    let results = service
        .validate_all(&rules, None, Some(&springfield()), &known, &district())
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].rule_id, 10);

    let rules = vec![required_rule(11), required_rule(12).blocking(true), spawn_rule()];
    let results = service
        .validate_all(&rules, None, Some(&springfield()), &known, &district())
        .await
        .unwrap();
    let ids: Vec<_> = results.iter().map(|r| r.rule_id).collect();
    assert_eq!(ids, [11, 12]);
}

#[tokio::test]
async fn test_validate_all_runs_every_passing_rule() {
    let service = service();
    let rules = vec![required_rule(20).blocking(true), required_rule(21)];

    let results = service
        .validate_all(
            &rules,
            Some(&FieldValue::text("filled")),
            Some(&springfield()),
            &KnownValues::new(),
            &district(),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_valid()));
}
