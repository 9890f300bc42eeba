//! Integration tests for the JSON document repository.
//!
//! Exercises ownership scoping, the unique `(user, name)` constraint,
//! search/ordering, partial updates and public UUID access.

use ccw_core::json_data::JsonDataOrderField;
use ccw_core::ordering::parse_ordering;
use ccw_db::models::json_data::{AdminJsonDataQuery, CreateJsonData, JsonDataListQuery, UpdateJsonData};
use ccw_db::models::user::{CreateUser, User};
use ccw_db::repositories::{JsonDataRepo, UserRepo};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, username: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            is_staff: false,
            is_superuser: false,
        },
    )
    .await
    .expect("user creation should succeed")
}

fn doc(name: &str) -> CreateJsonData {
    CreateJsonData {
        name: name.to_string(),
        data: json!({ "name": name, "widgets": [1, 2, 3] }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_returns_owner_and_generated_fields(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;

    let row = JsonDataRepo::create(&pool, alice.id, &doc("dashboard")).await.unwrap();

    assert_eq!(row.user_id, alice.id);
    assert_eq!(row.owner_username, "alice");
    assert_eq!(row.owner_email, "alice@example.com");
    assert_eq!(row.data["widgets"], json!([1, 2, 3]));
    assert!(!row.is_public);
    assert!(!row.uuid.is_nil());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_name_per_user_is_rejected(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;

    JsonDataRepo::create(&pool, alice.id, &doc("layout")).await.unwrap();

    let err = JsonDataRepo::create(&pool, alice.id, &doc("layout")).await.unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.code().as_deref(), Some("23505"));
            assert_eq!(db_err.constraint(), Some("uq_json_data_user_name"));
        }
        other => panic!("expected unique violation, got {other:?}"),
    }

    // The same name under another owner is fine.
    JsonDataRepo::create(&pool, bob.id, &doc("layout")).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn other_users_documents_are_invisible(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let mallory = new_user(&pool, "mallory").await;
    let row = JsonDataRepo::create(&pool, alice.id, &doc("secret")).await.unwrap();

    assert!(JsonDataRepo::find_for_user(&pool, mallory.id, row.id).await.unwrap().is_none());
    assert!(JsonDataRepo::update(&pool, mallory.id, row.id, &UpdateJsonData::default())
        .await
        .unwrap()
        .is_none());
    assert!(!JsonDataRepo::delete(&pool, mallory.id, row.id).await.unwrap());
    assert!(JsonDataRepo::set_public(&pool, mallory.id, row.id, true).await.unwrap().is_none());

    let listed = JsonDataRepo::list_for_user(&pool, mallory.id, &JsonDataListQuery::default())
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_requires_every_term(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    for name in ["Sales Report", "sales chart", "Weekly report", "100%_done"] {
        JsonDataRepo::create(&pool, alice.id, &doc(name)).await.unwrap();
    }

    let query = JsonDataListQuery {
        search_terms: vec!["sales".into(), "REPORT".into()],
        ..Default::default()
    };
    let rows = JsonDataRepo::list_for_user(&pool, alice.id, &query).await.unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Sales Report"]);

    // LIKE metacharacters match literally.
    let query = JsonDataListQuery {
        search_terms: vec!["%_".into()],
        ..Default::default()
    };
    let rows = JsonDataRepo::list_for_user(&pool, alice.id, &query).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "100%_done");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ordering_and_paging(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    for name in ["bravo", "alpha", "charlie"] {
        JsonDataRepo::create(&pool, alice.id, &doc(name)).await.unwrap();
    }

    let query = JsonDataListQuery {
        ordering: parse_ordering::<JsonDataOrderField>(Some("name")),
        ..Default::default()
    };
    let rows = JsonDataRepo::list_for_user(&pool, alice.id, &query).await.unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "bravo", "charlie"]);

    let query = JsonDataListQuery {
        ordering: parse_ordering::<JsonDataOrderField>(Some("-name")),
        limit: Some(1),
        offset: Some(1),
        ..Default::default()
    };
    let rows = JsonDataRepo::list_for_user(&pool, alice.id, &query).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "bravo");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn default_order_is_most_recently_updated(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let first = JsonDataRepo::create(&pool, alice.id, &doc("first")).await.unwrap();
    JsonDataRepo::create(&pool, alice.id, &doc("second")).await.unwrap();

    let patch = UpdateJsonData {
        data: Some(json!({ "touched": true })),
        ..Default::default()
    };
    let updated = JsonDataRepo::update(&pool, alice.id, first.id, &patch)
        .await
        .unwrap()
        .expect("owner can update");
    assert!(updated.updated_at >= first.updated_at);
    assert_eq!(updated.name, "first", "name is untouched by a data-only patch");

    let rows = JsonDataRepo::list_for_user(&pool, alice.id, &JsonDataListQuery::default())
        .await
        .unwrap();
    assert_eq!(rows[0].name, "first");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn distinct_names_are_sorted(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    for name in ["zeta", "alpha", "mid"] {
        JsonDataRepo::create(&pool, alice.id, &doc(name)).await.unwrap();
    }
    let names = JsonDataRepo::distinct_names(&pool, alice.id).await.unwrap();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn public_access_follows_flag(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let row = JsonDataRepo::create(&pool, alice.id, &doc("shared")).await.unwrap();

    assert!(JsonDataRepo::find_public_by_uuid(&pool, row.uuid).await.unwrap().is_none());

    JsonDataRepo::set_public(&pool, alice.id, row.id, true).await.unwrap();
    let public = JsonDataRepo::find_public_by_uuid(&pool, row.uuid)
        .await
        .unwrap()
        .expect("public document is visible");
    assert_eq!(public.name, "shared");

    JsonDataRepo::set_public(&pool, alice.id, row.id, false).await.unwrap();
    assert!(JsonDataRepo::find_public_by_uuid(&pool, row.uuid).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_user_cascades(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    JsonDataRepo::create(&pool, alice.id, &doc("doomed")).await.unwrap();

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(alice.id)
        .execute(&pool)
        .await
        .unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM json_data")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_listing_filters_by_owner_and_username(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;
    JsonDataRepo::create(&pool, alice.id, &doc("one")).await.unwrap();
    JsonDataRepo::create(&pool, bob.id, &doc("two")).await.unwrap();

    let all = JsonDataRepo::list_all(&pool, &AdminJsonDataQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let by_owner = JsonDataRepo::list_all(
        &pool,
        &AdminJsonDataQuery {
            user_id: Some(bob.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_owner.len(), 1);
    assert_eq!(by_owner[0].name, "two");

    let by_username = JsonDataRepo::list_all(
        &pool,
        &AdminJsonDataQuery {
            search_terms: vec!["ALI".into()],
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(by_username.len(), 1);
    assert_eq!(by_username[0].owner_username, "alice");
}
