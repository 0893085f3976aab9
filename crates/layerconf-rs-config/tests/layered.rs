//! End-to-end layering tests over the sample service schema.

use layerconf_rs_config::{
    Config, ConfigError, ConfigOptions, SourceErrorKind, TypeRegistry, Value, ViewItem, cascade,
    parse_assignments, validate,
};
use layerconf_rs_test_utils::{MemoryParser, SourceDir, data, service_schema};
use pretty_assertions::assert_eq;
use serde_json::json;

/// defaults -> system -> user -> command line.
#[test]
fn command_line_overrides_user_over_system() {
    let dir = SourceDir::new();
    let system = dir.write(
        "etc/service/config.json5",
        r#"{
          name: "svc",
          server: { host: "0.0.0.0", port: 80, timeout: 2.5 },
          upstreams: [{ host: "a", weight: 1 }, { host: "b", weight: 2 }],
          limits: { conns: 100 },
        }"#,
    );
    let user = dir.write(
        "home/.service/config.json5",
        r#"{ server: { port: 8080 }, upstreams: [{ host: "c", weight: 5 }], limits: { rps: 10 } }"#,
    );
    let overrides = parse_assignments(["server.timeout=10", "debug=TRUE", "tags=['blue']"])
        .expect("assignments");

    let config = Config::load(
        ConfigOptions::new(service_schema())
            .with_sources([&system, &user])
            .with_local_updates(overrides),
    )
    .expect("config");

    assert_eq!(
        config.merged(),
        &data(json!({
            "name": "svc",
            "debug": true,
            "server": { "host": "0.0.0.0", "port": 8080, "timeout": 10.0 },
            "upstreams": [{ "host": "c", "weight": 5 }],
            "tags": ["blue"],
            "limits": { "conns": 100, "rps": 10 },
        }))
    );

    let view = config.view();
    assert_eq!(view.get_str("upstreams.0.host"), Some("c".to_string()));
    assert_eq!(view.get_f64("server.timeout"), Some(10.0));
    assert_eq!(
        view.section("limits").map(|limits| limits.keys()),
        Some(vec!["conns".to_string(), "rps".to_string()])
    );
}

/// One bad file does not prevent the others from loading.
#[test]
fn reports_every_problem_of_a_bad_source() {
    let parser = MemoryParser::new()
        .with_source("good.json5", "{ name: 'ok' }")
        .with_source(
            "bad.json5",
            "{ name: ['x'], server: { port: 'http', extra: 1 }, tags: 'a', limits: { x: 1.5 } }",
        );
    let config = Config::load(
        ConfigOptions::new(service_schema())
            .with_sources(["good.json5", "bad.json5"])
            .with_parser(parser),
    )
    .expect("config");

    assert_eq!(
        config.errors(),
        vec![
            "bad.json5 - /limits/x - expected an integer, got float 1.5",
            "bad.json5 - /name - expected a string, got a list",
            "bad.json5 - /server/extra - unexpected key \"extra\", expected one of [host, port, timeout]",
            "bad.json5 - /server/port - invalid literal for int: \"http\"",
            "bad.json5 - /tags - expected a list, got string",
        ]
    );
    assert_eq!(config.view().get_str("name"), Some("ok".to_string()));
}

#[test]
fn missing_sources_fail_together() {
    let dir = SourceDir::new();
    let err = Config::load(
        ConfigOptions::new(service_schema())
            .with_source(dir.missing("system.json5"))
            .with_source(dir.missing("user.json5")),
    )
    .unwrap_err();

    let ConfigError::NoUsableSource { errors } = &err else {
        panic!("unexpected error: {err}");
    };
    let identifiers = errors
        .iter()
        .map(|err| {
            assert_eq!(err.kind, SourceErrorKind::NotFound);
            err.identifier.clone()
        })
        .collect::<Vec<_>>();
    assert_eq!(
        identifiers,
        vec![
            dir.missing("system.json5").display().to_string(),
            dir.missing("user.json5").display().to_string(),
        ]
    );
}

#[test]
fn views_reject_writes_and_stay_unchanged() {
    let config = Config::load(
        ConfigOptions::new(service_schema()).with_local_updates(data(json!({ "name": "svc" }))),
    )
    .expect("config");
    let view = config.view();
    let server = view.section("server").expect("server");

    assert!(matches!(
        view.set("name", "other"),
        Err(ConfigError::ReadOnly { .. })
    ));
    assert!(matches!(
        server.set("port", Value::Integer(1)),
        Err(ConfigError::ReadOnly { .. })
    ));
    assert_eq!(view.get_str("name"), Some("svc".to_string()));
    assert_eq!(config.view().get_i64("server.port"), Some(0));
}

#[test]
fn rejected_update_keeps_previous_view() {
    let mut config = Config::load(
        ConfigOptions::new(service_schema())
            .with_local_updates(data(json!({ "server": { "port": 80 } }))),
    )
    .expect("config");
    let before = config.view();
    let snapshot = before.to_value();

    let result = config.update(data(json!({
        "server": { "port": 81 },
        "upstreams": [{ "weight": "x" }],
    })));
    assert!(matches!(
        result,
        Err(ConfigError::UpdateRejected { ref errors }) if errors.len() == 1
    ));
    assert_eq!(config.view(), before);
    assert_eq!(config.view().to_value(), snapshot);

    config
        .update(data(json!({ "server": { "port": 81 } })))
        .expect("update");
    assert_eq!(before.get_i64("server.port"), Some(80));
    assert_eq!(config.view().get_i64("server.port"), Some(81));
}

#[test]
fn reload_picks_up_changed_sources() {
    let parser = MemoryParser::new().with_source("app.json5", "{ name: 'v1' }");
    let handle = parser.clone();
    let mut config = Config::load(
        ConfigOptions::new(service_schema())
            .with_source("app.json5")
            .with_parser(parser),
    )
    .expect("config");
    config
        .update(data(json!({ "tags": ["runtime"] })))
        .expect("update");

    handle.set("app.json5", "{ name: 'v2', tags: ['file'] }");
    config.reload().expect("reload");

    assert_eq!(handle.parse_count(), 2);
    assert_eq!(config.view().get_str("name"), Some("v2".to_string()));
    assert_eq!(
        config.view().get("tags"),
        Some(ViewItem::Sequence(vec![ViewItem::Scalar(Value::from("runtime"))]))
    );

    handle.remove("app.json5");
    assert!(config.reload().is_err());
    assert_eq!(config.view().get_str("name"), Some("v2".to_string()));
}

#[test]
fn skeleton_is_valid_and_cascade_is_idempotent() {
    let schema = service_schema();
    let registry = TypeRegistry::new();
    let skeleton = schema.skeleton(&registry).expect("skeleton");
    assert_eq!(validate(&schema, &registry, &skeleton), Vec::new());

    let update = data(json!({
        "server": { "host": "h", "timeout": "1.5" },
        "upstreams": [{ "host": "u", "weight": 3 }],
        "limits": { "a": 1 },
    }));
    assert_eq!(validate(&schema, &registry, &update), Vec::new());
    let once = cascade(&schema, &registry, [&skeleton, &update]).expect("once");
    let twice = cascade(&schema, &registry, [&once, &update]).expect("twice");
    assert_eq!(once, twice);
    assert_eq!(validate(&schema, &registry, &once), Vec::new());
}
