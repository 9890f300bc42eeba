//! Repository for the `json_data` table.
//!
//! Every user-facing method takes the owner's id and filters on it, so a
//! document belonging to someone else behaves exactly like a missing one.

use ccw_core::json_data::DEFAULT_ORDERING;
use ccw_core::ordering::order_clause;
use ccw_core::search::{clamp_limit, clamp_offset, contains_pattern, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use ccw_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::json_data::{
    AdminJsonDataQuery, CreateJsonData, JsonDataListQuery, JsonDataWithOwner, PublicJsonData,
    UpdateJsonData,
};

/// Row columns joined with the owner; expects aliases `j` (document) and `u` (user).
const COLUMNS: &str = "j.id, j.user_id, u.username AS owner_username, u.email AS owner_email, \
                        j.name, j.data, j.uuid, j.is_public, j.created_at, j.updated_at";

/// Provides CRUD and listing operations for JSON documents.
pub struct JsonDataRepo;

impl JsonDataRepo {
    /// Insert a document owned by `user_id`.
    ///
    /// A duplicate `(user_id, name)` fails with a unique violation on
    /// `uq_json_data_user_name`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateJsonData,
    ) -> Result<JsonDataWithOwner, sqlx::Error> {
        let query = format!(
            "WITH j AS (
                INSERT INTO json_data (user_id, name, data)
                VALUES ($1, $2, $3)
                RETURNING *
             )
             SELECT {COLUMNS} FROM j JOIN users u ON u.id = j.user_id"
        );
        sqlx::query_as::<_, JsonDataWithOwner>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.data)
            .fetch_one(pool)
            .await
    }

    /// Find one of `user_id`'s documents by id.
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<JsonDataWithOwner>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM json_data j JOIN users u ON u.id = j.user_id
             WHERE j.id = $1 AND j.user_id = $2"
        );
        sqlx::query_as::<_, JsonDataWithOwner>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List `user_id`'s documents with search, ordering and optional paging.
    ///
    /// Without `limit`/`offset` the full list is returned.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        params: &JsonDataListQuery,
    ) -> Result<Vec<JsonDataWithOwner>, sqlx::Error> {
        let mut query = format!(
            "SELECT {COLUMNS} FROM json_data j JOIN users u ON u.id = j.user_id
             WHERE j.user_id = $1"
        );
        let mut param_idx: usize = 2; // $1 is user_id

        for _ in &params.search_terms {
            query.push_str(&format!(" AND j.name ILIKE ${param_idx} ESCAPE '\\'"));
            param_idx += 1;
        }

        query.push_str(" ORDER BY ");
        query.push_str(&order_clause(&params.ordering, &DEFAULT_ORDERING, "j.id DESC"));

        let paged = params.limit.is_some() || params.offset.is_some();
        if paged {
            query.push_str(&format!(" LIMIT ${} OFFSET ${}", param_idx, param_idx + 1));
        }

        let mut q = sqlx::query_as::<_, JsonDataWithOwner>(&query).bind(user_id);
        for term in &params.search_terms {
            q = q.bind(contains_pattern(term));
        }
        if paged {
            q = q
                .bind(clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT))
                .bind(clamp_offset(params.offset));
        }

        q.fetch_all(pool).await
    }

    /// Distinct document names of `user_id`, alphabetically.
    pub async fn distinct_names(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT name FROM json_data WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Update a document. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if the document does not exist or is not owned by `user_id`.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateJsonData,
    ) -> Result<Option<JsonDataWithOwner>, sqlx::Error> {
        let query = format!(
            "WITH j AS (
                UPDATE json_data SET
                    name = COALESCE($3, name),
                    data = COALESCE($4, data)
                WHERE id = $1 AND user_id = $2
                RETURNING *
             )
             SELECT {COLUMNS} FROM j JOIN users u ON u.id = j.user_id"
        );
        sqlx::query_as::<_, JsonDataWithOwner>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.data)
            .fetch_optional(pool)
            .await
    }

    /// Flip the public flag of a document.
    ///
    /// Returns `None` if the document does not exist or is not owned by `user_id`.
    pub async fn set_public(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        is_public: bool,
    ) -> Result<Option<JsonDataWithOwner>, sqlx::Error> {
        let query = format!(
            "WITH j AS (
                UPDATE json_data SET is_public = $3
                WHERE id = $1 AND user_id = $2
                RETURNING *
             )
             SELECT {COLUMNS} FROM j JOIN users u ON u.id = j.user_id"
        );
        sqlx::query_as::<_, JsonDataWithOwner>(&query)
            .bind(id)
            .bind(user_id)
            .bind(is_public)
            .fetch_optional(pool)
            .await
    }

    /// Delete a document. Returns `true` if a row owned by `user_id` was removed.
    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM json_data WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fetch a document by its public UUID, only if it is marked public.
    pub async fn find_public_by_uuid(
        pool: &PgPool,
        uuid: Uuid,
    ) -> Result<Option<PublicJsonData>, sqlx::Error> {
        sqlx::query_as::<_, PublicJsonData>(
            "SELECT uuid, name, data, updated_at FROM json_data
             WHERE uuid = $1 AND is_public = true",
        )
        .bind(uuid)
        .fetch_optional(pool)
        .await
    }

    /// Admin listing across all owners, newest update first.
    pub async fn list_all(
        pool: &PgPool,
        params: &AdminJsonDataQuery,
    ) -> Result<Vec<JsonDataWithOwner>, sqlx::Error> {
        let mut query =
            format!("SELECT {COLUMNS} FROM json_data j JOIN users u ON u.id = j.user_id WHERE true");
        let mut param_idx: usize = 1;

        if params.user_id.is_some() {
            query.push_str(&format!(" AND j.user_id = ${param_idx}"));
            param_idx += 1;
        }
        for _ in &params.search_terms {
            query.push_str(&format!(
                " AND (j.name ILIKE ${param_idx} ESCAPE '\\' OR u.username ILIKE ${param_idx} ESCAPE '\\')"
            ));
            param_idx += 1;
        }
        query.push_str(&format!(
            " ORDER BY j.updated_at DESC, j.id DESC LIMIT ${} OFFSET ${}",
            param_idx,
            param_idx + 1
        ));

        let mut q = sqlx::query_as::<_, JsonDataWithOwner>(&query);
        if let Some(user_id) = params.user_id {
            q = q.bind(user_id);
        }
        for term in &params.search_terms {
            q = q.bind(contains_pattern(term));
        }
        q.bind(clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT))
            .bind(clamp_offset(params.offset))
            .fetch_all(pool)
            .await
    }
}
