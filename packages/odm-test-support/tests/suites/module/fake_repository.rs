use std::sync::Arc;

use document_manager::{DocumentError, DocumentManager, MemoryStore, Repository};
use odm_test_support::{ModuleConfig, ModuleError, StubMethods};
use serde_json::json;

use crate::support::{document_manager, started_module, user, Post, User};

#[tokio::test]
async fn test_fake_repository_is_served_by_document_manager() -> Result<(), ModuleError> {
    let dm = document_manager();
    let (mut module, _ctx) = started_module(&dm, ModuleConfig::default()).await?;

    let stub = module
        .have_fake_repository(
            "User",
            StubMethods::new()
                .returning("find_by_username", json!({"id": "u-stub", "name": "stubbed"})),
        )
        .await?;

    let repo = dm.get_repository("User")?;
    let stub_dyn: Arc<dyn Repository> = stub.clone();
    assert!(Arc::ptr_eq(&repo, &stub_dyn));
    assert!(dm.has_repository_override("User"));

    let found = repo.call("find_by_username", &[json!("anyone")]).await?;
    assert_eq!(found["name"], "stubbed");
    assert_eq!(stub.invocations("find_by_username"), 1);
    Ok(())
}

#[tokio::test]
async fn test_unstubbed_methods_reach_real_repository() -> Result<(), ModuleError> {
    let dm = document_manager();
    let (mut module, _ctx) = started_module(&dm, ModuleConfig::default()).await?;

    module
        .persist_document(user("judy", "judy@example.test"), json!(null))
        .await?;
    let stub = module
        .have_fake_repository("User", StubMethods::new().find(|_| Ok(None)))
        .await?;

    let repo = dm.get_repository("User")?;
    assert_eq!(repo.find_all().await?.len(), 1);
    assert!(repo.find("anything").await?.is_none());
    assert_eq!(stub.invocations("find_all"), 1);
    assert_eq!(stub.invocations("find"), 1);

    module.see_in_repository("User", json!({"name": "judy"})).await?;
    assert_eq!(stub.invocations("execute"), 1);
    Ok(())
}

#[tokio::test]
async fn test_assertions_consult_the_fake_repository() -> Result<(), ModuleError> {
    let dm = document_manager();
    let (mut module, _ctx) = started_module(&dm, ModuleConfig::default()).await?;

    module
        .have_fake_repository(
            "User",
            StubMethods::new().execute(|_| Ok(vec![json!({"id": "ghost", "name": "ghost"})])),
        )
        .await?;

    module.see_in_repository("User", json!({"name": "nobody"})).await?;
    let name = module
        .grab_from_repository("User", "name", json!({}))
        .await?;
    assert_eq!(name, json!("ghost"));
    Ok(())
}

#[tokio::test]
async fn test_nested_filters_resolve_through_fake_target_repository() -> Result<(), ModuleError> {
    let dm = document_manager();
    let (mut module, _ctx) = started_module(&dm, ModuleConfig::default()).await?;

    module
        .have_in_repository::<Post>(json!({"title": "stubbed author", "author": "u-stub"}))
        .await?;
    module
        .have_fake_repository(
            "User",
            StubMethods::new().find_by(|_| Ok(vec![json!({"id": "u-stub", "name": "stubbed"})])),
        )
        .await?;

    module
        .see_in_repository("Post", json!({"author": {"name": "stubbed"}}))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_after_restores_real_repository() -> Result<(), ModuleError> {
    let dm = document_manager();
    let (mut module, ctx) = started_module(&dm, ModuleConfig::default()).await?;

    module
        .have_fake_repository("User", StubMethods::new().returning("find_by_username", json!(null)))
        .await?;
    module
        .have_fake_repository("Post", StubMethods::new())
        .await?;
    module.after(&ctx).await?;

    assert!(!dm.has_repository_override("User"));
    assert!(!dm.has_repository_override("Post"));
    let err = dm
        .get_repository("User")?
        .call("find_by_username", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::UnknownMethod { .. }));
    Ok(())
}

#[tokio::test]
async fn test_disabled_overrides_only_warn() -> Result<(), ModuleError> {
    let dm = Arc::new(
        DocumentManager::builder(Arc::new(MemoryStore::new()))
            .register::<User>()
            .repository_overrides(false)
            .build(),
    );
    let (mut module, ctx) = started_module(&dm, ModuleConfig::default()).await?;

    let stub = module
        .have_fake_repository("User", StubMethods::new().find_all(|| Ok(Vec::new())))
        .await?;

    let repo = dm.get_repository("User")?;
    let stub_dyn: Arc<dyn Repository> = stub;
    assert!(!Arc::ptr_eq(&repo, &stub_dyn));

    module.after(&ctx).await?;
    Ok(())
}

#[tokio::test]
async fn test_fake_repository_for_unknown_document_fails() -> Result<(), ModuleError> {
    let dm = document_manager();
    let (mut module, _ctx) = started_module(&dm, ModuleConfig::default()).await?;

    let result = module.have_fake_repository("Ghost", StubMethods::new()).await;
    assert!(matches!(
        result,
        Err(ModuleError::Document(DocumentError::UnknownDocument { .. }))
    ));
    Ok(())
}
