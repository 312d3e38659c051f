use proto_splice::{resolve_schema_json, PatternRule, ResolveConfig};

fn event_config() -> ResolveConfig {
    ResolveConfig {
        patterns: vec![PatternRule {
            suffix: "events".to_string(),
            interface: "com.acme.DomainEvent".to_string(),
        }],
        uuid_interface: Some("com.acme.UuidValue".to_string()),
    }
}

#[test]
fn event_declaration_collects_built_in_and_pattern_directives() {
    let input = r#"{
        "files": [
            {
                "path": "acme/order_events.proto",
                "package": "acme.orders",
                "messages": [
                    {"name": "OrderPlaced", "fields": [{"name": "order_id"}]}
                ]
            }
        ]
    }"#;

    let resolution = resolve_schema_json(input, &event_config()).unwrap();
    assert!(resolution.errors.is_empty());
    assert_eq!(resolution.directives.len(), 2);

    let contents: Vec<&str> = resolution
        .directives
        .iter()
        .map(|d| d.content.as_str())
        .collect();
    assert_eq!(contents, ["messaging.EventMessage,", "com.acme.DomainEvent,"]);
    for directive in &resolution.directives {
        assert_eq!(directive.file, "acme/orders/OrderPlaced");
        assert_eq!(directive.point, "implements:acme.orders.OrderPlaced");
        assert!(directive.content.ends_with(','));
    }
}

#[test]
fn command_and_rejection_conventions() {
    let input = r#"{
        "files": [
            {
                "path": "acme/order_commands.proto",
                "package": "acme",
                "messages": [{"name": "PlaceOrder"}]
            },
            {
                "path": "acme/rejections.proto",
                "package": "acme",
                "messages": [{"name": "OrderCannotShip"}]
            }
        ]
    }"#;

    let resolution = resolve_schema_json(input, &ResolveConfig::default()).unwrap();
    let contents: Vec<&str> = resolution
        .directives
        .iter()
        .map(|d| d.content.as_str())
        .collect();
    assert_eq!(
        contents,
        ["messaging.CommandMessage,", "messaging.RejectionMessage,"]
    );
}

#[test]
fn explicit_option_wins_over_file_blanket() {
    let input = r#"{
        "files": [
            {
                "path": "acme/types.proto",
                "package": "acme",
                "options": {"every_implements": "acme.Blanket"},
                "messages": [
                    {"name": "Special", "options": {"implements": "acme.Marker"}},
                    {"name": "Plain"}
                ]
            }
        ]
    }"#;

    let resolution = resolve_schema_json(input, &ResolveConfig::default()).unwrap();
    let contents: Vec<(&str, &str)> = resolution
        .directives
        .iter()
        .map(|d| (d.point.as_str(), d.content.as_str()))
        .collect();
    assert_eq!(
        contents,
        [
            ("implements:acme.Special", "acme.Marker,"),
            ("implements:acme.Plain", "acme.Blanket,"),
        ]
    );
}

#[test]
fn nested_declarations_are_excluded_from_pattern_rules() {
    let input = r#"{
        "files": [
            {
                "path": "acme/order_events.proto",
                "package": "acme",
                "messages": [
                    {
                        "name": "OrderPlaced",
                        "fields": [{"name": "order_id"}],
                        "nested": [{"name": "Detail"}]
                    }
                ]
            }
        ]
    }"#;

    let resolution = resolve_schema_json(input, &event_config()).unwrap();
    assert!(resolution
        .directives
        .iter()
        .all(|d| d.point == "implements:acme.OrderPlaced"));
}

#[test]
fn uuid_shaped_declaration_resolves_the_identity_parameter() {
    let input = r#"{
        "files": [
            {
                "path": "acme/ids.proto",
                "package": "acme",
                "messages": [
                    {"name": "UserId", "fields": [{"name": "uuid"}]},
                    {"name": "Pair", "fields": [{"name": "uuid"}, {"name": "extra"}]}
                ]
            }
        ]
    }"#;

    let resolution = resolve_schema_json(input, &event_config()).unwrap();
    assert_eq!(resolution.directives.len(), 1);
    let directive = &resolution.directives[0];
    assert_eq!(directive.point, "implements:acme.UserId");
    assert_eq!(directive.content, "com.acme.UuidValue<UserId>,");
}

#[test]
fn resolution_serializes_for_the_emitter() {
    let input = r#"{
        "files": [
            {
                "path": "acme/order_events.proto",
                "package": "acme",
                "messages": [
                    {"name": "OrderPlaced", "fields": [{"name": "order_id"}]}
                ]
            }
        ]
    }"#;

    let resolution = resolve_schema_json(input, &event_config()).unwrap();
    let json = resolution.to_json_string(true).unwrap();
    assert!(json.contains("\"directives\""));
    assert!(json.contains("implements:acme.OrderPlaced"));
    assert!(json.contains("\"errors\": []"));
}

#[test]
fn classification_is_idempotent() {
    let input = r#"{
        "files": [
            {
                "path": "acme/order_events.proto",
                "package": "acme",
                "messages": [
                    {"name": "OrderPlaced", "fields": [{"name": "order_id"}]},
                    {"name": "OrderCancelled", "fields": [{"name": "order_id"}]}
                ]
            }
        ]
    }"#;

    let first = resolve_schema_json(input, &event_config()).unwrap();
    let second = resolve_schema_json(input, &event_config()).unwrap();
    assert_eq!(
        first.to_json_string(false).unwrap(),
        second.to_json_string(false).unwrap()
    );
}
