use std::sync::Arc;

use document_manager::DocumentManager;
use odm_test_support::{ModuleConfig, ModuleError, OdmModule, SessionContext};
use serde_json::json;

use crate::support::{document_manager, started_module, Post, User};

/// Two users (alice in Oslo, bob) and a post by alice reviewed by bob.
async fn seeded() -> Result<(Arc<DocumentManager>, OdmModule, SessionContext), ModuleError> {
    let dm = document_manager();
    let (module, ctx) = started_module(&dm, ModuleConfig::default()).await?;

    module
        .have_in_repository::<User>(json!({
            "id": "u-alice",
            "name": "alice",
            "email": "alice@example.test",
            "active": true,
            "address": {"city": "Oslo", "country": "NO"}
        }))
        .await?;
    module
        .have_in_repository::<User>(json!({
            "id": "u-bob",
            "name": "bob",
            "email": "bob@example.test"
        }))
        .await?;
    module
        .have_in_repository::<Post>(json!({
            "id": "p-1",
            "title": "Documents in tests",
            "author": "u-alice",
            "reviewers": ["u-bob"],
            "tags": ["odm", "testing"]
        }))
        .await?;

    Ok((dm, module, ctx))
}

#[tokio::test]
async fn test_flat_filters() -> Result<(), ModuleError> {
    let (_dm, module, _ctx) = seeded().await?;

    module
        .see_in_repository("User", json!({"name": "alice", "active": true}))
        .await?;
    module.see_in_repository("User", json!({"active": false})).await?;
    module
        .dont_see_in_repository("User", json!({"name": "alice", "active": false}))
        .await?;
    module.see_in_repository("Post", json!({"tags": "odm"})).await?;
    module.see_in_repository("User", json!({})).await?;
    Ok(())
}

#[tokio::test]
async fn test_assertions_flush_pending_documents() -> Result<(), ModuleError> {
    let (dm, module, _ctx) = seeded().await?;

    dm.persist("User", json!({"name": "mallory", "email": "m@example.test"}))?;
    module.see_in_repository("User", json!({"name": "mallory"})).await?;
    assert_eq!(dm.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_reference_filters() -> Result<(), ModuleError> {
    let (_dm, module, _ctx) = seeded().await?;

    module
        .see_in_repository("Post", json!({"author": {"name": "alice"}}))
        .await?;
    module
        .dont_see_in_repository("Post", json!({"author": {"name": "bob"}}))
        .await?;
    module
        .see_in_repository("Post", json!({"reviewers": {"name": "bob"}}))
        .await?;
    module
        .see_in_repository(
            "Post",
            json!({"author": {"name": "alice", "active": true}, "title": "Documents in tests"}),
        )
        .await?;
    module
        .dont_see_in_repository("Post", json!({"author": {"name": "nobody"}}))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_embedded_filters() -> Result<(), ModuleError> {
    let (_dm, module, _ctx) = seeded().await?;

    module
        .see_in_repository("User", json!({"address": {"city": "Oslo"}}))
        .await?;
    module
        .dont_see_in_repository("User", json!({"address": {"city": "Bergen"}}))
        .await?;
    module
        .see_in_repository("User", json!({"address.country": "NO"}))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_unsupported_filters() -> Result<(), ModuleError> {
    let (_dm, module, _ctx) = seeded().await?;

    let deep = module
        .see_in_repository("Post", json!({"author": {"address": {"city": "Oslo"}}}))
        .await;
    assert!(matches!(deep, Err(ModuleError::UnsupportedCriteria { .. })));

    let not_object = module.see_in_repository("Post", json!("alice")).await;
    assert!(matches!(not_object, Err(ModuleError::UnsupportedCriteria { .. })));

    let unknown = module.see_in_repository("Ghost", json!({})).await;
    assert!(matches!(unknown, Err(ModuleError::Document(_))));
    Ok(())
}

#[tokio::test]
#[should_panic(expected = r#"'User' document matching {"name":"zoe"}, but none was found"#)]
async fn test_see_in_repository_fails_when_absent() {
    let (_dm, module, _ctx) = seeded().await.unwrap();
    module
        .see_in_repository("User", json!({"name": "zoe"}))
        .await
        .unwrap();
}

#[tokio::test]
#[should_panic(expected = r#"'Post' document matching {"author":{"name":"alice"}}, but found 1"#)]
async fn test_dont_see_in_repository_fails_when_present() {
    let (_dm, module, _ctx) = seeded().await.unwrap();
    module
        .dont_see_in_repository("Post", json!({"author": {"name": "alice"}}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_grab_from_repository() -> Result<(), ModuleError> {
    let (_dm, module, _ctx) = seeded().await?;

    let email = module
        .grab_from_repository("User", "email", json!({"name": "bob"}))
        .await?;
    assert_eq!(email, json!("bob@example.test"));

    let city = module
        .grab_from_repository("User", "address.city", json!({"name": "alice"}))
        .await?;
    assert_eq!(city, json!("Oslo"));

    let missing = module
        .grab_from_repository("User", "nickname", json!({"name": "alice"}))
        .await?;
    assert!(missing.is_null());

    match module
        .grab_from_repository("User", "email", json!({"name": "zoe"}))
        .await
    {
        Err(ModuleError::NotFound { document, criteria }) => {
            assert_eq!(document, "User");
            assert_eq!(criteria, r#"{"name":"zoe"}"#);
        }
        other => panic!("Expected NotFound, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_grab_from_repository_escapes_path_segments() -> Result<(), ModuleError> {
    let (dm, module, _ctx) = seeded().await?;

    dm.persist(
        "User",
        json!({
            "id": "u-odd",
            "name": "odd",
            "email": "odd@example.test",
            "limits": {"req/s": 5, "a~b": 6, "req": {"s": 7}}
        }),
    )?;

    for (field, expected) in [("limits.req/s", 5), ("limits.a~b", 6), ("limits.req.s", 7)] {
        let value = module
            .grab_from_repository("User", field, json!({"name": "odd"}))
            .await?;
        assert_eq!(value, json!(expected), "field {field}");
    }
    Ok(())
}

#[tokio::test]
async fn test_grab_documents_from_repository() -> Result<(), ModuleError> {
    let (_dm, module, _ctx) = seeded().await?;

    let users: Vec<User> = module.grab_documents_from_repository(json!({})).await?;
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob"]);

    let reviewed: Vec<Post> = module
        .grab_documents_from_repository(json!({"reviewers": {"name": "bob"}}))
        .await?;
    assert_eq!(reviewed.len(), 1);
    assert_eq!(reviewed[0].author.as_deref(), Some("u-alice"));

    let post: Post = module
        .grab_document_from_repository(json!({"tags": "testing"}))
        .await?;
    assert_eq!(post.id.as_deref(), Some("p-1"));

    let none = module
        .grab_document_from_repository::<User>(json!({"name": "zoe"}))
        .await;
    assert!(matches!(none, Err(ModuleError::NotFound { .. })));
    Ok(())
}
