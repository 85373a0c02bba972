//! Rating repository.

use std::sync::Arc;

use crate::entities::{Rating, rating};
use riviu_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect, Set,
    sea_query::{Alias, Expr, Func, OnConflict},
};

#[derive(Debug, FromQueryResult)]
struct AverageResult {
    average: Option<f64>,
}

/// Rating repository for database operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the score a user gave a restaurant.
    pub async fn find_by_user_and_restaurant(
        &self,
        user_id: &str,
        restaurant_id: &str,
    ) -> AppResult<Option<rating::Model>> {
        Rating::find()
            .filter(rating::Column::UserId.eq(user_id))
            .filter(rating::Column::RestaurantId.eq(restaurant_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a score, replacing the user's previous score for the restaurant.
    pub async fn upsert(
        &self,
        id: String,
        restaurant_id: &str,
        user_id: &str,
        score: i32,
    ) -> AppResult<()> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let model = rating::ActiveModel {
            id: Set(id),
            restaurant_id: Set(restaurant_id.to_string()),
            user_id: Set(user_id.to_string()),
            score: Set(score),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        Rating::insert(model)
            .on_conflict(
                OnConflict::columns([rating::Column::RestaurantId, rating::Column::UserId])
                    .update_columns([rating::Column::Score, rating::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Mean score of a restaurant computed by the database; 0 when unrated.
    pub async fn average_for_restaurant(&self, restaurant_id: &str) -> AppResult<f64> {
        let result = Rating::find()
            .filter(rating::Column::RestaurantId.eq(restaurant_id))
            .select_only()
            .column_as(
                Expr::expr(Func::cast_as(
                    Func::avg(Expr::col(rating::Column::Score)),
                    Alias::new("float8"),
                )),
                "average",
            )
            .into_model::<AverageResult>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.and_then(|r| r.average).unwrap_or(0.0))
    }

    /// Number of scores given to a restaurant.
    pub async fn count_for_restaurant(&self, restaurant_id: &str) -> AppResult<u64> {
        Rating::find()
            .filter(rating::Column::RestaurantId.eq(restaurant_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
