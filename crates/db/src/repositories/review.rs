//! Review repository.

use std::sync::Arc;

use crate::entities::{Review, ReviewLike, review, review_like};
use riviu_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};

/// Review repository for database operations.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a review by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<review::Model>> {
        Review::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a review by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<review::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReviewNotFound(id.to_string()))
    }

    /// Restaurant reviews for the feed, newest first.
    ///
    /// `restaurant_ids` narrows the feed to the given restaurants when set.
    pub async fn find_restaurant_reviews(
        &self,
        restaurant_ids: Option<&[String]>,
        limit: u64,
    ) -> AppResult<Vec<review::Model>> {
        let mut query = Review::find()
            .filter(review::Column::RestaurantId.is_not_null())
            .order_by_desc(review::Column::CreatedAt);

        if let Some(ids) = restaurant_ids {
            query = query.filter(review::Column::RestaurantId.is_in(ids.to_vec()));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reviews of one restaurant, newest first.
    pub async fn find_by_restaurant(&self, restaurant_id: &str) -> AppResult<Vec<review::Model>> {
        Review::find()
            .filter(review::Column::RestaurantId.eq(restaurant_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reviews of one dish, newest first.
    pub async fn find_by_dish(&self, dish_id: &str) -> AppResult<Vec<review::Model>> {
        Review::find()
            .filter(review::Column::DishId.eq(dish_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reviews written by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<review::Model>> {
        Review::find()
            .filter(review::Column::UserId.eq(user_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new review.
    pub async fn create(&self, model: review::ActiveModel) -> AppResult<review::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a review and its likes.
    pub async fn delete_cascade(&self, id: &str) -> AppResult<()> {
        let db_err = |e: sea_orm::DbErr| AppError::Database(e.to_string());
        let txn = self.db.begin().await.map_err(db_err)?;

        ReviewLike::delete_many()
            .filter(review_like::Column::ReviewId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        Review::delete_by_id(id).exec(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_review(id: &str, restaurant_id: &str, rating: i32) -> review::Model {
        review::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            restaurant_id: Some(restaurant_id.to_string()),
            dish_id: None,
            rating,
            comment: "Nice".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<review::Model>::new()])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::ReviewNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_restaurant_reviews() {
        let r1 = create_test_review("rv1", "r1", 5);
        let r2 = create_test_review("rv2", "r2", 3);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1, r2]])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let result = repo.find_restaurant_reviews(None, 50).await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.restaurant_id.is_some()));
    }

    #[tokio::test]
    async fn test_delete_cascade() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        assert!(repo.delete_cascade("rv1").await.is_ok());
    }
}
