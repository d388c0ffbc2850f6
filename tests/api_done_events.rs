//! HTTP contract tests for `/api/doneevents` and the `/api/events` feed.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use chrono::{DateTime, Utc};
use common::{TestServer, UNKNOWN_ID, id_of};
use doomie::ChangeKind;
use doomie::model::{NewDoneEvent, RecordId};
use futures_util::StreamExt;
use serde_json::{Value, json};
use std::time::Duration;

fn time_of(doc: &Value) -> DateTime<Utc> {
    doc["time"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn time_is_assigned_by_server() {
    let srv = TestServer::start().await;
    let task = srv.create_task("Task", 10.0).await;
    let before = Utc::now();

    let resp = srv
        .post(
            "/api/doneevents",
            &json!({ "taskId": id_of(&task), "time": "2000-01-01T00:00:00Z" }),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let event: Value = resp.json().await.unwrap();
    assert!(time_of(&event) > before);
    assert_eq!(event["taskName"], "Task");
    assert_eq!(event["taskId"], task["_id"]);
}

#[tokio::test]
async fn unknown_task_is_rejected_and_nothing_saved() {
    let srv = TestServer::start().await;
    let resp = srv
        .post("/api/doneevents", &json!({ "taskId": UNKNOWN_ID }))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"]["taskId"]["kind"], "reference");
    assert_eq!(
        body["errors"]["taskId"]["message"],
        "Referenced task id not found"
    );

    let list: Vec<Value> = srv.get("/api/doneevents").await.json().await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn task_id_is_required() {
    let srv = TestServer::start().await;
    let resp = srv.post("/api/doneevents", &json!({})).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"]["taskId"]["kind"], "required");
}

#[tokio::test]
async fn unknown_button_is_rejected() {
    let srv = TestServer::start().await;
    let task = srv.create_task("Task", 10.0).await;
    let resp = srv
        .post(
            "/api/doneevents",
            &json!({ "taskId": id_of(&task), "dButtonId": UNKNOWN_ID }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"]["dButtonId"]["kind"], "reference");
}

#[tokio::test]
async fn event_through_existing_button() {
    let srv = TestServer::start().await;
    let task = srv.create_task("Task", 10.0).await;
    let button = srv.create_button(&json!({ "taskId": id_of(&task) })).await;

    let resp = srv
        .post(
            "/api/doneevents",
            &json!({ "taskId": id_of(&task), "dButtonId": id_of(&button) }),
        )
        .await;
    assert_eq!(resp.status(), 201);
    let event: Value = resp.json().await.unwrap();
    assert_eq!(event["dButtonId"], button["_id"]);

    let fetched: Value = srv
        .get(&format!("/api/doneevents/{}", id_of(&event)))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, event);
}

#[tokio::test]
async fn task_name_is_a_snapshot() {
    let srv = TestServer::start().await;
    let task = srv.create_task("Before", 10.0).await;
    let event: Value = srv
        .post("/api/doneevents", &json!({ "taskId": id_of(&task) }))
        .await
        .json()
        .await
        .unwrap();

    let resp = srv
        .put(
            &format!("/api/tasks/{}", id_of(&task)),
            &json!({ "name": "After" }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    let fetched: Value = srv
        .get(&format!("/api/doneevents/{}", id_of(&event)))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["taskName"], "Before");
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let srv = TestServer::start().await;
    let task = srv.create_task("Task", 10.0).await;
    let event: Value = srv
        .post("/api/doneevents", &json!({ "taskId": id_of(&task) }))
        .await
        .json()
        .await
        .unwrap();
    let path = format!("/api/doneevents/{}", id_of(&event));

    assert_eq!(srv.delete(&path).await.status(), 204);
    assert_eq!(srv.delete(&path).await.status(), 404);
    assert_eq!(srv.get(&path).await.status(), 404);
    assert_eq!(srv.get("/api/doneevents/zzz").await.status(), 400);
}

#[tokio::test]
async fn subscribers_see_saves_and_removes() {
    let srv = TestServer::start().await;
    let client = srv.client();
    let task = srv.create_task("Stream", 10.0).await;
    let task_id = RecordId::parse(&id_of(&task)).unwrap();

    let mut changes = client.done_event_changes().await.unwrap();

    let created = client
        .create_done_event(&NewDoneEvent::for_task(task_id.clone()))
        .await
        .unwrap();
    let saved = tokio::time::timeout(Duration::from_secs(5), changes.next())
        .await
        .expect("save within timeout")
        .expect("stream open")
        .unwrap();
    assert_eq!(saved.kind, ChangeKind::Save);
    assert_eq!(saved.doc, created);

    assert!(client.delete_done_event(&created.id).await.unwrap());
    let removed = tokio::time::timeout(Duration::from_secs(5), changes.next())
        .await
        .expect("remove within timeout")
        .expect("stream open")
        .unwrap();
    assert_eq!(removed.kind, ChangeKind::Remove);
    assert_eq!(removed.doc.id, created.id);
}

#[tokio::test]
async fn rejected_event_is_not_published() {
    let srv = TestServer::start().await;
    let mut rx = {
        let client = srv.client();
        client.done_event_changes().await.unwrap()
    };

    let resp = srv
        .post("/api/doneevents", &json!({ "taskId": UNKNOWN_ID }))
        .await;
    assert_eq!(resp.status(), 400);

    let quiet = tokio::time::timeout(Duration::from_millis(300), rx.next()).await;
    assert!(quiet.is_err(), "no change expected for a rejected write");
}
