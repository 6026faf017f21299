use anyhow::Result;
use axum::http::StatusCode;
use entity::ab_test::{self, Status};
use platform_api::ApiError;
use products_crm::{VariantDraft, VariantSet};
use serde_json::{Value, json};
use suite_tests::{MockBackend, Tables, timestamp};
use uuid::Uuid;

/// Stores the submitted configuration the way the backend function does.
fn create_ab_test(body: Value, tables: &mut Tables) -> Result<Value, (StatusCode, Value)> {
    let mut row = body;
    row["id"] = json!(Uuid::new_v4());
    row["status"] = json!("running");
    row["winner_variant_id"] = Value::Null;
    row["created_at"] = json!(timestamp(chrono::Utc::now()));
    tables
        .entry("ab_tests".into())
        .or_default()
        .push(row.clone());
    Ok(row)
}

fn declare_winner(body: Value, tables: &mut Tables) -> Result<Value, (StatusCode, Value)> {
    let rows = tables.entry("ab_tests".into()).or_default();
    let Some(row) = rows.iter_mut().find(|r| r["id"] == body["test_id"]) else {
        return Err((StatusCode::NOT_FOUND, json!({ "error": "unknown test" })));
    };
    let known = row["variants"]
        .as_array()
        .is_some_and(|vs| vs.iter().any(|v| v["id"] == body["variant_id"]));
    if !known {
        return Err((
            StatusCode::BAD_REQUEST,
            json!({ "error": "variant does not belong to this test" }),
        ));
    }
    row["status"] = json!("completed");
    row["winner_variant_id"] = body["variant_id"].clone();
    Ok(json!({ "test_id": body["test_id"], "winner_variant_id": body["variant_id"] }))
}

fn variants() -> VariantSet {
    VariantSet::new(vec![
        VariantDraft::new("Control", "Spring sale starts today").with_subject("Spring sale"),
        VariantDraft::new("Urgent", "Only 48 hours left").with_subject("48 hours only"),
        VariantDraft::new("Plain", "Our spring range is here"),
    ])
    .expect("three variants")
}

#[tokio::test]
async fn created_test_round_trips_variants() -> Result<()> {
    let backend = MockBackend::start().await;
    backend.on_function("create-ab-test", create_ab_test);
    let crm = backend.crm();

    let mut set = variants();
    let control = set.variants()[0].id;
    set.set_split(control, 10)?;
    assert_eq!(set.splits(), vec![10, 45, 45]);
    let submitted = set.variants().to_vec();

    let campaign_id = Uuid::new_v4();
    let created = crm.ab_tests.create(campaign_id, "Spring subject lines", set).await?;
    assert_eq!(created.status, Status::Running);
    assert_eq!(created.campaign_id, campaign_id);

    let fetched = crm.ab_tests.get(created.id).await?;
    assert_eq!(fetched.variants.len(), submitted.len());
    for (sent, stored) in submitted.iter().zip(&fetched.variants) {
        assert_eq!(stored.name, sent.name);
        assert_eq!(stored.content, sent.content);
        assert_eq!(stored.subject, sent.subject);
        assert_eq!(stored.traffic_split, sent.traffic_split);
    }

    let calls = backend.function_calls("create-ab-test");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["variants"][2].get("subject"), None);
    assert_eq!(calls[0]["variants"][1]["traffic_split"], 45);

    let for_campaign = crm.ab_tests.for_campaign(campaign_id).await?;
    assert_eq!(for_campaign.len(), 1);
    Ok(())
}

#[tokio::test]
async fn declaring_a_winner_completes_the_test() -> Result<()> {
    let backend = MockBackend::start().await;
    backend.on_function("create-ab-test", create_ab_test);
    backend.on_function("declare-ab-test-winner", declare_winner);
    let crm = backend.crm();

    let created = crm
        .ab_tests
        .create(Uuid::new_v4(), "Winner test", variants())
        .await?;
    let urgent = created.variants[1].id;

    let declared = crm.ab_tests.declare_winner(created.id, urgent).await?;
    assert_eq!(declared.winner_variant_id, urgent);

    let fetched: ab_test::Model = crm.ab_tests.get(created.id).await?;
    assert_eq!(fetched.status, Status::Completed);
    assert_eq!(fetched.winner().map(|v| v.name.as_str()), Some("Urgent"));
    Ok(())
}

#[tokio::test]
async fn function_failures_carry_the_backend_message() -> Result<()> {
    let backend = MockBackend::start().await;
    backend.on_function("create-ab-test", create_ab_test);
    backend.on_function("declare-ab-test-winner", declare_winner);
    let crm = backend.crm();

    let created = crm
        .ab_tests
        .create(Uuid::new_v4(), "Stranger", variants())
        .await?;
    let err = crm
        .ab_tests
        .declare_winner(created.id, Uuid::new_v4())
        .await
        .unwrap_err();
    match err {
        ApiError::Function { name, message } => {
            assert_eq!(name, "declare-ab-test-winner");
            assert_eq!(message, "variant does not belong to this test");
        }
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn invalid_configuration_is_rejected_locally() -> Result<()> {
    let backend = MockBackend::start().await;
    backend.on_function("create-ab-test", create_ab_test);
    let crm = backend.crm();

    let err = crm
        .ab_tests
        .create(Uuid::new_v4(), "   ", variants())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(backend.function_calls("create-ab-test").is_empty());
    Ok(())
}
