use serde_json::{Value as Json, json};
use std::sync::Arc;
use tabledoc::config::EngineConfig;
use tabledoc::dispatch::Dispatcher;
use tabledoc::engine::TableEngine;
use tabledoc::identity::CallerContext;
use tabledoc::store::MemoryStore;

fn dispatcher() -> Dispatcher<MemoryStore> {
    Dispatcher::new(Arc::new(TableEngine::new(
        Arc::new(MemoryStore::new()),
        EngineConfig::literal(),
    )))
}

fn error_of(response: &Json) -> &str {
    response["error"].as_str().expect("error response")
}

async fn create(d: &Dispatcher<MemoryStore>, caller: &CallerContext) -> String {
    let response = d
        .handle(
            Some(caller),
            "create_table",
            json!({
                "Name": "T",
                "Columns": [{"Key": "x", "Label": "X"}],
                "Rows": [{"Values": ["true"]}, {"Values": ["plain", "extra"]}]
            }),
        )
        .await;
    response["tableId"]
        .as_str()
        .expect("tableId in response")
        .to_string()
}

#[tokio::test]
async fn unauthenticated_requests_never_reach_the_engine() {
    let d = dispatcher();
    let response = d
        .handle(None, "create_table", json!({"Name": "T", "Columns": [{"Key": "x"}]}))
        .await;
    assert_eq!(error_of(&response), "User must be authenticated");

    let alice = CallerContext::new("alice");
    let listed = d.handle(Some(&alice), "list_tables", Json::Null).await;
    assert_eq!(listed, json!({"tables": []}));
}

#[tokio::test]
async fn list_returns_documents_with_ids() {
    let d = dispatcher();
    let alice = CallerContext::new("alice");
    let id = create(&d, &alice).await;

    let listed = d.handle(Some(&alice), "list_tables", json!({})).await;
    assert_eq!(
        listed,
        json!({"tables": [{
            "tableId": id,
            "Name": "T",
            "Columns": [{"Key": "x", "Label": "X"}],
            "Rows": [{"x": true}, {"x": "plain"}],
            "Metadata": {}
        }]})
    );
}

#[tokio::test]
async fn every_mutation_reports_success_shape() {
    let d = dispatcher();
    let alice = CallerContext::new("alice");
    let id = create(&d, &alice).await;
    let ok = json!({"success": true});

    let calls = [
        ("add_column", json!({"tableId": id, "column": {"Key": "y"}})),
        ("update_column", json!({"tableId": id, "columnKey": "y", "updates": {"Label": "Y"}})),
        ("add_row", json!({"tableId": id, "row": {"x": 1, "y": 2}})),
        ("update_row", json!({"tableId": id, "rowIndex": 2, "updates": {"y": 3}})),
        ("delete_row", json!({"tableId": id, "rowIndex": 0})),
        ("delete_column", json!({"tableId": id, "columnKey": "x"})),
        ("update_table", json!({"tableId": id, "updates": {"Name": "Renamed"}})),
    ];
    for (op, payload) in calls {
        assert_eq!(d.handle(Some(&alice), op, payload).await, ok, "{op}");
    }

    let listed = d.handle(Some(&alice), "list_tables", json!({})).await;
    let table = &listed["tables"][0];
    assert_eq!(table["Name"], "Renamed");
    assert_eq!(table["Columns"], json!([{"Key": "y", "Label": "Y"}]));
    assert_eq!(table["Rows"], json!([{}, {"y": 3}]));

    let cloned = d
        .handle(Some(&alice), "clone_table", json!({"tableId": id}))
        .await;
    let clone_id = cloned["tableId"].as_str().expect("clone id");
    assert_ne!(clone_id, id);

    assert_eq!(
        d.handle(Some(&alice), "delete_table", json!({"tableId": id})).await,
        ok
    );
    let listed = d.handle(Some(&alice), "list_tables", json!({})).await;
    assert_eq!(listed["tables"].as_array().expect("tables").len(), 1);
}

#[tokio::test]
async fn missing_fields_are_reported_as_errors() {
    let d = dispatcher();
    let alice = CallerContext::new("alice");
    let id = create(&d, &alice).await;

    let cases = [
        ("create_table", json!({"Columns": [{"Key": "x"}]}), "Name"),
        ("create_table", json!({"Name": "T"}), "Columns"),
        ("update_table", json!({"updates": {}}), "tableId"),
        ("delete_table", json!({}), "tableId"),
        ("clone_table", json!({}), "tableId"),
        ("add_column", json!({"tableId": id}), "column"),
        ("update_column", json!({"tableId": id}), "columnKey"),
        ("delete_column", json!({"tableId": id}), "columnKey"),
        ("add_row", json!({"tableId": id}), "row"),
        ("add_row", json!({"tableId": id, "row": {}}), "row"),
        ("update_row", json!({"tableId": id, "updates": {}}), "rowIndex"),
        ("delete_row", json!({"tableId": id}), "rowIndex"),
    ];
    for (op, payload, field) in cases {
        let response = d.handle(Some(&alice), op, payload).await;
        let message = error_of(&response);
        assert!(message.contains(field), "{op}: {message}");
    }
}

#[tokio::test]
async fn engine_failures_become_error_payloads() {
    let d = dispatcher();
    let alice = CallerContext::new("alice");
    let id = create(&d, &alice).await;

    let response = d
        .handle(Some(&alice), "delete_row", json!({"tableId": id, "rowIndex": 5}))
        .await;
    assert!(error_of(&response).contains("Row index out of range"));

    let response = d
        .handle(Some(&alice), "clone_table", json!({"tableId": "ghost"}))
        .await;
    assert!(error_of(&response).contains("not found"));

    let bob = CallerContext::new("bob");
    let response = d
        .handle(Some(&bob), "add_row", json!({"tableId": id, "row": {"x": 1}}))
        .await;
    assert!(error_of(&response).contains("not found"));

    let response = d.handle(Some(&alice), "truncate", json!({})).await;
    assert!(error_of(&response).contains("unknown operation"));
}

/// The literal profile keeps duplicate column keys, as the unhardened
/// handlers did.
#[tokio::test]
async fn literal_profile_accepts_duplicate_column() {
    let d = dispatcher();
    let alice = CallerContext::new("alice");
    let id = create(&d, &alice).await;
    let response = d
        .handle(Some(&alice), "add_column", json!({"tableId": id, "column": {"Key": "x"}}))
        .await;
    assert_eq!(response, json!({"success": true}));

    let listed = d.handle(Some(&alice), "list_tables", json!({})).await;
    assert_eq!(listed["tables"][0]["Columns"].as_array().expect("columns").len(), 2);
}
