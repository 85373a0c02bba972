//! Dish repository.

use std::sync::Arc;

use crate::entities::{Dish, Review, ReviewLike, dish, review, review_like};
use riviu_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

/// Dish repository for database operations.
#[derive(Clone)]
pub struct DishRepository {
    db: Arc<DatabaseConnection>,
}

impl DishRepository {
    /// Create a new dish repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a dish by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<dish::Model>> {
        Dish::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a dish by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<dish::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Dish {id}")))
    }

    /// Menu of a restaurant, ordered by name.
    pub async fn find_by_restaurant(&self, restaurant_id: &str) -> AppResult<Vec<dish::Model>> {
        Dish::find()
            .filter(dish::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(dish::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new dish.
    pub async fn create(&self, model: dish::ActiveModel) -> AppResult<dish::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a dish.
    pub async fn update(&self, model: dish::ActiveModel) -> AppResult<dish::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a dish together with its reviews and their likes.
    pub async fn delete_cascade(&self, id: &str) -> AppResult<()> {
        let db_err = |e: sea_orm::DbErr| AppError::Database(e.to_string());
        let txn = self.db.begin().await.map_err(db_err)?;

        let review_ids: Vec<String> = Review::find()
            .filter(review::Column::DishId.eq(id))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|r| r.id)
            .collect();

        ReviewLike::delete_many()
            .filter(review_like::Column::ReviewId.is_in(review_ids))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        Review::delete_many()
            .filter(review::Column::DishId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        Dish::delete_by_id(id).exec(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_dish(id: &str, restaurant_id: &str, name: &str) -> dish::Model {
        dish::Model {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            name: name.to_string(),
            description: "Tasty".to_string(),
            price: 1200,
            image_url: None,
            category_id: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_restaurant() {
        let d1 = create_test_dish("d1", "r1", "Carbonara");
        let d2 = create_test_dish("d2", "r1", "Tiramisu");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[d1, d2]])
                .into_connection(),
        );

        let repo = DishRepository::new(db);
        let result = repo.find_by_restaurant("r1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].price, 1200);
    }

    #[tokio::test]
    async fn test_delete_cascade() {
        let review = review::Model {
            id: "rv1".to_string(),
            user_id: "u1".to_string(),
            restaurant_id: None,
            dish_id: Some("d1".to_string()),
            rating: 4,
            comment: "Good".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[review]])
                .append_exec_results((0..3).map(|_| MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }))
                .into_connection(),
        );

        let repo = DishRepository::new(db);
        assert!(repo.delete_cascade("d1").await.is_ok());
    }
}
