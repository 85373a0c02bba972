//! Like repository (restaurant likes and review likes).

use std::sync::Arc;

use crate::entities::{PostLike, ReviewLike, post_like, review_like};
use riviu_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};

/// What a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTarget {
    Restaurant,
    Review,
}

/// A like row reduced to the fields aggregation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRow {
    pub id: String,
    pub target_id: String,
    pub user_id: String,
}

impl From<post_like::Model> for LikeRow {
    fn from(m: post_like::Model) -> Self {
        Self {
            id: m.id,
            target_id: m.restaurant_id,
            user_id: m.user_id,
        }
    }
}

impl From<review_like::Model> for LikeRow {
    fn from(m: review_like::Model) -> Self {
        Self {
            id: m.id,
            target_id: m.review_id,
            user_id: m.user_id,
        }
    }
}

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the like a user left on a target.
    pub async fn find(
        &self,
        target: LikeTarget,
        target_id: &str,
        user_id: &str,
    ) -> AppResult<Option<LikeRow>> {
        let row = match target {
            LikeTarget::Restaurant => PostLike::find()
                .filter(post_like::Column::RestaurantId.eq(target_id))
                .filter(post_like::Column::UserId.eq(user_id))
                .one(self.db.as_ref())
                .await
                .map(|m| m.map(LikeRow::from)),
            LikeTarget::Review => ReviewLike::find()
                .filter(review_like::Column::ReviewId.eq(target_id))
                .filter(review_like::Column::UserId.eq(user_id))
                .one(self.db.as_ref())
                .await
                .map(|m| m.map(LikeRow::from)),
        };
        row.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a like.
    pub async fn create(
        &self,
        target: LikeTarget,
        id: String,
        target_id: &str,
        user_id: &str,
    ) -> AppResult<LikeRow> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let row = match target {
            LikeTarget::Restaurant => post_like::ActiveModel {
                id: Set(id),
                restaurant_id: Set(target_id.to_string()),
                user_id: Set(user_id.to_string()),
                created_at: Set(now),
            }
            .insert(self.db.as_ref())
            .await
            .map(LikeRow::from),
            LikeTarget::Review => review_like::ActiveModel {
                id: Set(id),
                review_id: Set(target_id.to_string()),
                user_id: Set(user_id.to_string()),
                created_at: Set(now),
            }
            .insert(self.db.as_ref())
            .await
            .map(LikeRow::from),
        };
        row.map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a like by its ID.
    pub async fn delete(&self, target: LikeTarget, id: &str) -> AppResult<()> {
        let result = match target {
            LikeTarget::Restaurant => PostLike::delete_by_id(id).exec(self.db.as_ref()).await,
            LikeTarget::Review => ReviewLike::delete_by_id(id).exec(self.db.as_ref()).await,
        };
        result.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Number of likes on a target.
    pub async fn count(&self, target: LikeTarget, target_id: &str) -> AppResult<u64> {
        let count = match target {
            LikeTarget::Restaurant => {
                PostLike::find()
                    .filter(post_like::Column::RestaurantId.eq(target_id))
                    .count(self.db.as_ref())
                    .await
            }
            LikeTarget::Review => {
                ReviewLike::find()
                    .filter(review_like::Column::ReviewId.eq(target_id))
                    .count(self.db.as_ref())
                    .await
            }
        };
        count.map_err(|e| AppError::Database(e.to_string()))
    }

    /// All like rows for a batch of targets.
    pub async fn find_for_targets(
        &self,
        target: LikeTarget,
        target_ids: &[String],
    ) -> AppResult<Vec<LikeRow>> {
        self.find_rows(target, target_ids, None).await
    }

    /// The like rows a single user left on a batch of targets.
    pub async fn find_for_targets_by_user(
        &self,
        target: LikeTarget,
        target_ids: &[String],
        user_id: &str,
    ) -> AppResult<Vec<LikeRow>> {
        self.find_rows(target, target_ids, Some(user_id)).await
    }

    async fn find_rows(
        &self,
        target: LikeTarget,
        target_ids: &[String],
        user_id: Option<&str>,
    ) -> AppResult<Vec<LikeRow>> {
        if target_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = match target {
            LikeTarget::Restaurant => {
                let mut query = PostLike::find()
                    .filter(post_like::Column::RestaurantId.is_in(target_ids.to_vec()));
                if let Some(user_id) = user_id {
                    query = query.filter(post_like::Column::UserId.eq(user_id));
                }
                query
                    .all(self.db.as_ref())
                    .await
                    .map(|rows| rows.into_iter().map(LikeRow::from).collect())
            }
            LikeTarget::Review => {
                let mut query = ReviewLike::find()
                    .filter(review_like::Column::ReviewId.is_in(target_ids.to_vec()));
                if let Some(user_id) = user_id {
                    query = query.filter(review_like::Column::UserId.eq(user_id));
                }
                query
                    .all(self.db.as_ref())
                    .await
                    .map(|rows| rows.into_iter().map(LikeRow::from).collect())
            }
        };
        rows.map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn post_like(id: &str, restaurant_id: &str, user_id: &str) -> post_like::Model {
        post_like::Model {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn review_like(id: &str, review_id: &str, user_id: &str) -> review_like::Model {
        review_like::Model {
            id: id.to_string(),
            review_id: review_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_restaurant_like() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post_like("l1", "r1", "u1")]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let row = repo
            .find(LikeTarget::Restaurant, "r1", "u1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(row.target_id, "r1");
        assert_eq!(row.user_id, "u1");
    }

    #[tokio::test]
    async fn test_find_for_targets_maps_review_likes() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    review_like("l1", "rv1", "u1"),
                    review_like("l2", "rv1", "u2"),
                ]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let rows = repo
            .find_for_targets(LikeTarget::Review, &["rv1".to_string()])
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.target_id == "rv1"));
    }

    #[tokio::test]
    async fn test_find_for_targets_empty_batch() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = LikeRepository::new(db);
        let rows = repo
            .find_for_targets_by_user(LikeTarget::Restaurant, &[], "u1")
            .await
            .unwrap();

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post_like("l1", "r1", "u1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let row = repo
            .create(LikeTarget::Restaurant, "l1".to_string(), "r1", "u1")
            .await
            .unwrap();
        assert_eq!(row.id, "l1");

        assert!(repo.delete(LikeTarget::Restaurant, "l1").await.is_ok());
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert_eq!(repo.count(LikeTarget::Review, "rv1").await.unwrap(), 7);
    }
}
