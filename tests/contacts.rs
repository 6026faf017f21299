use anyhow::Result;
use chrono::{Duration, Utc};
use entity::contact;
use platform_api::ApiError;
use products_crm::{ContactService, CrudService, ListParams};
use serde_json::json;
use suite_tests::{MockBackend, timestamp};
use uuid::Uuid;

fn draft(first: &str, last: &str, email: &str, tags: &[&str]) -> contact::Draft {
    contact::Draft {
        first_name: first.into(),
        last_name: Some(last.into()),
        email: Some(email.into()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

async fn seeded(backend: &MockBackend) -> Result<(ContactService, Vec<contact::Model>)> {
    let service: ContactService = CrudService::new(backend.client());
    let mut created = Vec::new();
    for d in [
        draft("Ada", "Lovelace", "ada@analytical.test", &["vip"]),
        draft("Grace", "Hopper", "grace@navy.test", &["vip", "speaker"]),
        draft("Alan", "Turing", "alan@bletchley.test", &[]),
    ] {
        created.push(service.create(&d).await?);
    }
    Ok((service, created))
}

#[tokio::test]
async fn create_get_update_delete() -> Result<()> {
    let backend = MockBackend::start().await;
    let (service, created) = seeded(&backend).await?;
    let ada = &created[0];

    let fetched = service.get(ada.id).await?;
    assert_eq!(&fetched, ada);
    assert_eq!(fetched.display_name(), "Ada Lovelace");

    let changes = contact::Changes {
        company_name: Some("Analytical Engines".into()),
        ..Default::default()
    };
    let updated = service.update(ada.id, &changes).await?;
    assert_eq!(updated.company_name.as_deref(), Some("Analytical Engines"));
    assert_eq!(updated.email, ada.email);

    let deleted = service.delete(ada.id).await?;
    assert_eq!(deleted.id, ada.id);
    assert!(matches!(service.get(ada.id).await, Err(ApiError::NotFound)));
    assert!(matches!(
        service.update(ada.id, &changes).await,
        Err(ApiError::NotFound)
    ));
    assert_eq!(backend.rows("contacts").len(), 2);
    Ok(())
}

#[tokio::test]
async fn search_tags_and_ids() -> Result<()> {
    let backend = MockBackend::start().await;
    let (service, created) = seeded(&backend).await?;

    let hits = service.search("  HOPPER ", ListParams::default()).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].first_name, "Grace");

    let by_email = service.search("bletchley", ListParams::default()).await?;
    assert_eq!(by_email[0].first_name, "Alan");

    let vips = service.with_tag("vip", ListParams::default()).await?;
    let mut names: Vec<_> = vips.iter().map(|c| c.first_name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["Ada", "Grace"]);

    let picked = service
        .by_ids(&[created[2].id, created[0].id, Uuid::new_v4()])
        .await?;
    assert_eq!(picked.len(), 2);
    assert!(service.by_ids(&[]).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn list_orders_and_pages() -> Result<()> {
    let backend = MockBackend::start().await;
    let base = Utc::now() - Duration::hours(1);
    backend.seed(
        "contacts",
        (0..5).map(|i| {
            json!({
                "id": Uuid::new_v4(),
                "first_name": format!("Contact {i}"),
                "last_name": null,
                "email": null,
                "phone": null,
                "company_name": null,
                "tags": [],
                "owner_id": null,
                "created_at": timestamp(base + Duration::minutes(i)),
                "updated_at": null,
            })
        }),
    );
    let service: ContactService = CrudService::new(backend.client());

    let newest = service.list(ListParams::page(2, 0)).await?;
    let names: Vec<_> = newest.iter().map(|c| c.first_name.as_str()).collect();
    assert_eq!(names, ["Contact 4", "Contact 3"]);

    let next = service.list(ListParams::page(2, 2)).await?;
    assert_eq!(next[0].first_name, "Contact 2");
    Ok(())
}

#[tokio::test]
async fn invalid_drafts_never_reach_the_backend() -> Result<()> {
    let backend = MockBackend::start().await;
    let service: ContactService = CrudService::new(backend.client());
    let err = service
        .create(&draft("Ada", "Lovelace", "not-an-email", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("email")));
    assert!(backend.rows("contacts").is_empty());

    let err = service.search(" (%) ", ListParams::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    Ok(())
}

#[tokio::test]
async fn wrong_api_key_is_unauthorized() -> Result<()> {
    let backend = MockBackend::start().await;
    let service: ContactService = CrudService::new(backend.client_with_key("stolen"));
    let err = service.list(ListParams::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(err.code(), "UNAUTHORIZED");
    Ok(())
}
