//! Per-user JSON document model and DTOs.

use ccw_core::json_data::JsonDataOrderField;
use ccw_core::ordering::OrderTerm;
use ccw_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserSummary;

/// A `json_data` row joined with its owner's public fields.
#[derive(Debug, Clone, FromRow)]
pub struct JsonDataWithOwner {
    pub id: DbId,
    pub user_id: DbId,
    pub owner_username: String,
    pub owner_email: String,
    pub name: String,
    pub data: serde_json::Value,
    pub uuid: Uuid,
    pub is_public: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// API representation with the owner nested as `user`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDataResponse {
    pub id: DbId,
    pub user: UserSummary,
    pub name: String,
    pub data: serde_json::Value,
    pub uuid: Uuid,
    pub is_public: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<JsonDataWithOwner> for JsonDataResponse {
    fn from(row: JsonDataWithOwner) -> Self {
        Self {
            id: row.id,
            user: UserSummary {
                id: row.user_id,
                username: row.owner_username,
                email: row.owner_email,
            },
            name: row.name,
            data: row.data,
            uuid: row.uuid,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// The subset of a document exposed through its public UUID.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PublicJsonData {
    pub uuid: Uuid,
    pub name: String,
    pub data: serde_json::Value,
    pub updated_at: Timestamp,
}

/// DTO for inserting a document. The owner comes from the authenticated user.
#[derive(Debug)]
pub struct CreateJsonData {
    pub name: String,
    pub data: serde_json::Value,
}

/// DTO for updating a document. `None` fields are left unchanged.
#[derive(Debug, Default)]
pub struct UpdateJsonData {
    pub name: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// Filters for listing one user's documents.
#[derive(Debug, Default)]
pub struct JsonDataListQuery {
    /// Every term must match `name` (case-insensitive substring).
    pub search_terms: Vec<String>,
    pub ordering: Vec<OrderTerm<JsonDataOrderField>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Filters for the admin listing across all users.
#[derive(Debug, Default)]
pub struct AdminJsonDataQuery {
    pub user_id: Option<DbId>,
    /// Every term must match `name` or the owner's username.
    pub search_terms: Vec<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
