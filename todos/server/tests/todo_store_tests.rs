use todos_server::todo::validation::TitleLookup;
use todos_server::todo::{TodoChanges, TodoStore, TodoStoreError};

mod common;

use common::{new_todo, setup_db};

const OWNER: i64 = 1;
const STRANGER: i64 = 2;

fn changes(title: &str, description: &str) -> TodoChanges {
    TodoChanges {
        title: title.to_string(),
        description: description.to_string(),
        active: None,
        completed: None,
    }
}

#[tokio::test]
async fn can_create_todo_with_defaults() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);

    let created = store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .expect("Failed to create todo");

    assert_eq!(created.title(), "Buy milk");
    assert_eq!(created.description(), "2%");
    assert_eq!(created.user_id(), OWNER);
    assert!(created.active());
    assert!(!created.completed());
    assert_eq!(created.created_at(), created.updated_at());
}

#[tokio::test]
async fn can_find_created_todo_as_owner() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    let created = store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();

    let found = store.find_owned(OWNER, created.id()).await.unwrap();

    assert_eq!(found, created);
}

#[tokio::test]
async fn foreign_todo_is_not_found() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    let created = store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();

    let found = store.find_owned(STRANGER, created.id()).await;
    let missing = store.find_owned(OWNER, created.id() + 100).await;

    assert!(matches!(found, Err(TodoStoreError::NotFound(id)) if id == created.id()));
    assert!(matches!(missing, Err(TodoStoreError::NotFound(_))));
}

#[tokio::test]
async fn can_list_only_owned_todos_in_insertion_order() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    store.create(OWNER, new_todo("First", "a")).await.unwrap();
    store
        .create(STRANGER, new_todo("Not mine", "b"))
        .await
        .unwrap();
    store.create(OWNER, new_todo("Second", "c")).await.unwrap();

    let titles: Vec<String> = store
        .list_by_owner(OWNER)
        .await
        .unwrap()
        .iter()
        .map(|todo| todo.title().to_string())
        .collect();

    assert_eq!(titles, vec!["First", "Second"]);
    assert!(store.list_by_owner(99).await.unwrap().is_empty());
}

#[tokio::test]
async fn can_reject_duplicate_title_across_owners() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();

    let result = store
        .create(STRANGER, new_todo("Buy milk", "anything"))
        .await;

    assert!(matches!(result, Err(TodoStoreError::DuplicateTitle(title)) if title == "Buy milk"));
    assert!(store.list_by_owner(STRANGER).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_creates_with_same_title_succeed_once() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);

    let (first, second) = tokio::join!(
        store.create(OWNER, new_todo("Race", "a")),
        store.create(STRANGER, new_todo("Race", "b")),
    );

    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1);
    let failure = if first.is_err() { first } else { second };
    assert!(matches!(failure, Err(TodoStoreError::DuplicateTitle(_))));
}

#[tokio::test]
async fn can_report_existing_titles_for_any_owner() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();

    assert!(store.title_exists("Buy milk").await.unwrap());
    assert!(!store.title_exists("Buy bread").await.unwrap());
}

#[tokio::test]
async fn update_overwrites_text_and_keeps_unsupplied_flags() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    let created = store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();

    let updated = store
        .update(OWNER, created.id(), changes("Buy oat milk", "1l"))
        .await
        .unwrap();

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.title(), "Buy oat milk");
    assert_eq!(updated.description(), "1l");
    assert_eq!(updated.active(), created.active());
    assert_eq!(updated.completed(), created.completed());
    assert_eq!(updated.created_at(), created.created_at());
    assert!(updated.updated_at() >= created.updated_at());
    assert_eq!(store.find_owned(OWNER, created.id()).await.unwrap(), updated);
}

#[tokio::test]
async fn supplied_flag_sticks_across_later_updates() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    let created = store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();

    let completed = store
        .update(
            OWNER,
            created.id(),
            TodoChanges {
                completed: Some(true),
                ..changes("Buy milk", "2%")
            },
        )
        .await
        .unwrap();
    let untouched = store
        .update(OWNER, created.id(), changes("Buy milk", "3%"))
        .await
        .unwrap();

    assert!(completed.completed());
    assert!(untouched.completed());
}

#[tokio::test]
async fn explicit_false_flag_is_applied() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    let created = store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();
    assert!(created.active());

    let updated = store
        .update(
            OWNER,
            created.id(),
            TodoChanges {
                active: Some(false),
                ..changes("Buy milk", "2%")
            },
        )
        .await
        .unwrap();

    assert!(!updated.active());
}

#[tokio::test]
async fn cannot_update_foreign_todo() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    let created = store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();

    let result = store
        .update(STRANGER, created.id(), changes("Hijacked", "x"))
        .await;

    assert!(matches!(result, Err(TodoStoreError::NotFound(_))));
    assert_eq!(
        store.find_owned(OWNER, created.id()).await.unwrap().title(),
        "Buy milk"
    );
}

#[tokio::test]
async fn update_to_taken_title_is_duplicate() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    store
        .create(STRANGER, new_todo("Taken", "x"))
        .await
        .unwrap();
    let created = store
        .create(OWNER, new_todo("Mine", "y"))
        .await
        .unwrap();

    let result = store
        .update(OWNER, created.id(), changes("Taken", "y"))
        .await;

    assert!(matches!(result, Err(TodoStoreError::DuplicateTitle(_))));
}

#[tokio::test]
async fn can_delete_owned_todo() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    let created = store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();

    store.delete(OWNER, created.id()).await.unwrap();

    assert!(matches!(
        store.find_owned(OWNER, created.id()).await,
        Err(TodoStoreError::NotFound(_))
    ));
    assert!(matches!(
        store.delete(OWNER, created.id()).await,
        Err(TodoStoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn cannot_delete_foreign_todo() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);
    let created = store
        .create(OWNER, new_todo("Buy milk", "2%"))
        .await
        .unwrap();

    let result = store.delete(STRANGER, created.id()).await;

    assert!(matches!(result, Err(TodoStoreError::NotFound(_))));
    assert!(store.find_owned(OWNER, created.id()).await.is_ok());
}

#[tokio::test]
async fn out_of_range_id_is_not_found() {
    let db = setup_db().await.expect("Failed to setup test database");
    let store = TodoStore::new(&db);

    assert!(matches!(
        store.find_owned(OWNER, u32::MAX).await,
        Err(TodoStoreError::NotFound(u32::MAX))
    ));
    assert!(matches!(
        store.delete(OWNER, u32::MAX).await,
        Err(TodoStoreError::NotFound(u32::MAX))
    ));
}
