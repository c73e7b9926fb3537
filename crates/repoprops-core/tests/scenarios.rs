//! End-to-end row processing against a scripted remote.
//!
//! Each test feeds manifest text through the loader and driver and checks
//! the exact sequence of remote calls.

use repoprops_client::fakes::{RecordedCall, ScriptedApi};
use repoprops_core::{
    Delimiter, IdentityResolver, ManifestLoader, PropertiesStatus, RunDriver, SettingsStatus,
};
use serde_json::{json, Value};

fn patch(path: &str, body: Value) -> RecordedCall {
    RecordedCall {
        method: "PATCH",
        path: path.to_string(),
        body: Some(body),
    }
}

fn property_body(name: &str, value: &str) -> Value {
    json!({"properties": [{"property_name": name, "value": value}]})
}

fn accepting_api() -> ScriptedApi {
    ScriptedApi::new()
        .on_patch("/repos/acme/widget", 200, json!({}))
        .on_patch("/repos/acme/widget/properties/values", 204, Value::Null)
}

#[tokio::test]
async fn settings_and_properties_in_order() {
    let api = accepting_api().with_branches("acme", "widget", &["main", "dev"]);
    let rows = ManifestLoader::default().parse_str(
        "acme/widget::tier=gold,owner_team=infra::has_wiki=false,default_branch=main\n",
    );

    let summary = RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    let calls = api.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].method, "GET");
    assert!(calls[0].path.starts_with("/repos/acme/widget/branches"));
    assert_eq!(
        calls[1..],
        [
            patch(
                "/repos/acme/widget",
                json!({"has_wiki": false, "default_branch": "main"})
            ),
            patch(
                "/repos/acme/widget/properties/values",
                property_body("tier", "gold")
            ),
            patch(
                "/repos/acme/widget/properties/values",
                property_body("owner_team", "infra")
            ),
        ]
    );
    assert_eq!(summary.settings_applied(), 1);
    assert_eq!(summary.properties_applied(), 2);
}

#[tokio::test]
async fn bare_name_uses_default_owner() {
    let api = ScriptedApi::new().on_patch(
        "/repos/default-org/widget/properties/values",
        204,
        Value::Null,
    );
    let rows = ManifestLoader::default().parse_str("widget::tier=gold");

    let summary = RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    assert_eq!(
        api.calls(),
        vec![patch(
            "/repos/default-org/widget/properties/values",
            property_body("tier", "gold")
        )]
    );
    assert_eq!(summary.rows[0].settings, SettingsStatus::Skipped);
}

#[tokio::test]
async fn invalid_boolean_dropped_and_no_property_call() {
    let api = accepting_api();
    let rows =
        ManifestLoader::default().parse_str("acme/widget::::has_wiki=notabool,private=true");

    let summary = RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    assert_eq!(
        api.calls(),
        vec![patch("/repos/acme/widget", json!({"private": true}))]
    );
    assert_eq!(summary.rows[0].properties, PropertiesStatus::Skipped);
}

#[tokio::test]
async fn unknown_branch_skips_settings_but_not_properties() {
    let api = accepting_api().with_branches("acme", "widget", &["main"]);
    let rows =
        ManifestLoader::default().parse_str("acme/widget::tier=gold::default_branch=release");

    let summary = RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].method, "GET");
    assert_eq!(
        calls[1],
        patch(
            "/repos/acme/widget/properties/values",
            property_body("tier", "gold")
        )
    );
    assert_eq!(summary.rows[0].settings, SettingsStatus::Skipped);
}

#[tokio::test]
async fn remote_failure_does_not_stop_next_row() {
    let api = ScriptedApi::new()
        .on_patch("/repos/acme/broken", 500, json!({"message": "Server Error"}))
        .on_patch("/repos/acme/broken/properties/values", 204, Value::Null)
        .on_patch("/repos/acme/widget", 200, json!({}))
        .on_patch("/repos/acme/widget/properties/values", 204, Value::Null);
    let rows = ManifestLoader::default().parse_str(
        "acme/broken::tier=gold::private=true\nacme/widget::tier=silver::private=false\n",
    );

    let summary = RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    let paths: Vec<String> = api.calls().into_iter().map(|c| c.path).collect();
    assert_eq!(
        paths,
        vec![
            "/repos/acme/broken",
            "/repos/acme/broken/properties/values",
            "/repos/acme/widget",
            "/repos/acme/widget/properties/values",
        ]
    );
    assert!(matches!(
        summary.rows[0].settings,
        SettingsStatus::Failed(ref msg) if msg.contains("500")
    ));
    assert!(matches!(summary.rows[1].settings, SettingsStatus::Applied(_)));
    assert_eq!(summary.settings_failed(), 1);
    assert_eq!(summary.settings_applied(), 1);
}

#[tokio::test]
async fn legacy_dialect_only_sets_properties() {
    let api = ScriptedApi::new()
        .on_patch("/repos/acme/a/properties/values", 204, Value::Null)
        .on_patch("/repos/acme/b/properties/values", 204, Value::Null);
    let rows = ManifestLoader::new(Delimiter::Semicolon)
        .parse_str("acme/a;tier=gold\nacme/b;tier=silver\n");

    let summary = RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    assert_eq!(
        api.calls(),
        vec![
            patch("/repos/acme/a/properties/values", property_body("tier", "gold")),
            patch("/repos/acme/b/properties/values", property_body("tier", "silver")),
        ]
    );
    assert_eq!(summary.settings_skipped(), 2);
}

#[tokio::test]
async fn all_invalid_settings_make_no_call() {
    let api = accepting_api();
    let rows = ManifestLoader::default().parse_str("acme/widget::::topics=a,archived=maybe");

    RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn transport_failure_on_property_continues_with_next() {
    let api = ScriptedApi::new()
        .fail_patch("/repos/acme/a/properties/values", "connection reset")
        .on_patch("/repos/acme/b/properties/values", 204, Value::Null);
    let rows = ManifestLoader::default().parse_str("acme/a::x=1,y=2\nacme/b::z=3\n");

    let summary = RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    assert_eq!(api.patches().len(), 3);
    assert_eq!(
        summary.rows[0].properties,
        PropertiesStatus::Applied {
            applied: 0,
            failed: 2
        }
    );
    assert_eq!(
        summary.rows[1].properties,
        PropertiesStatus::Applied {
            applied: 1,
            failed: 0
        }
    );
}

#[tokio::test]
async fn boolean_values_are_case_insensitive() {
    let api = accepting_api();
    let rows = ManifestLoader::default()
        .parse_str("acme/widget::::allow_auto_merge=TRUE,archived=False,is_template=1");

    RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    assert_eq!(
        api.calls(),
        vec![patch(
            "/repos/acme/widget",
            json!({"allow_auto_merge": true, "archived": false})
        )]
    );
}

#[tokio::test]
async fn invalid_reference_without_settings_counts_as_skipped() {
    let api = ScriptedApi::new();
    let rows = ManifestLoader::default().parse_str("acme/::tier=gold::private=true\n/x::\n");

    let summary = RunDriver::new(&api, IdentityResolver::new("default-org"))
        .run(&rows)
        .await;

    assert!(api.calls().is_empty());
    assert_eq!(summary.rows_processed(), 2);
    assert_eq!(summary.settings_failed(), 1);
    assert_eq!(summary.settings_skipped(), 1);
    assert_eq!(summary.rows[1].properties, PropertiesStatus::Skipped);
}
