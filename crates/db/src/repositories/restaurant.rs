//! Restaurant repository.

use std::sync::Arc;

use crate::entities::{
    Comment, CommentReaction, CommentReply, Dish, PostLike, Rating, Restaurant, RestaurantTag,
    Review, ReviewLike, comment, comment_reaction, comment_reply, dish, post_like, rating,
    restaurant, restaurant_tag, review, review_like,
};
use riviu_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
    sea_query::{Expr, Func},
};
use tracing::info;

/// Filters for listing restaurants.
#[derive(Debug, Clone, Default)]
pub struct RestaurantFilter {
    /// Only restaurants in this category.
    pub category_id: Option<String>,
    /// Case-insensitive substring of the restaurant name.
    pub name_contains: Option<String>,
}

/// Restaurant repository for database operations.
#[derive(Clone)]
pub struct RestaurantRepository {
    db: Arc<DatabaseConnection>,
}

impl RestaurantRepository {
    /// Create a new restaurant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a restaurant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<restaurant::Model>> {
        Restaurant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a restaurant by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<restaurant::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::RestaurantNotFound(id.to_string()))
    }

    /// Find restaurants by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<restaurant::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Restaurant::find()
            .filter(restaurant::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List restaurants, newest first.
    pub async fn list(&self, filter: &RestaurantFilter) -> AppResult<Vec<restaurant::Model>> {
        let mut query = Restaurant::find().order_by_desc(restaurant::Column::CreatedAt);

        if let Some(category_id) = &filter.category_id {
            query = query.filter(restaurant::Column::CategoryId.eq(category_id.as_str()));
        }

        if let Some(keyword) = filter.name_contains.as_deref().map(str::trim) {
            if !keyword.is_empty() {
                query = query.filter(
                    Expr::expr(Func::lower(Expr::col(restaurant::Column::Name)))
                        .like(format!("%{}%", keyword.to_lowercase())),
                );
            }
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Restaurants created by a user, newest first.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<restaurant::Model>> {
        Restaurant::find()
            .filter(restaurant::Column::OwnerId.eq(owner_id))
            .order_by_desc(restaurant::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new restaurant.
    pub async fn create(&self, model: restaurant::ActiveModel) -> AppResult<restaurant::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a restaurant.
    pub async fn update(&self, model: restaurant::ActiveModel) -> AppResult<restaurant::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a restaurant and everything hanging off it in one transaction.
    ///
    /// Removes dishes, reviews of the restaurant and of its dishes with their likes,
    /// comments with their reactions and replies, ratings, likes and tag links.
    pub async fn delete_cascade(&self, id: &str) -> AppResult<()> {
        let db_err = |e: sea_orm::DbErr| AppError::Database(e.to_string());
        let txn = self.db.begin().await.map_err(db_err)?;

        let dish_ids: Vec<String> = Dish::find()
            .filter(dish::Column::RestaurantId.eq(id))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|d| d.id)
            .collect();

        let review_ids: Vec<String> = Review::find()
            .filter(
                Condition::any()
                    .add(review::Column::RestaurantId.eq(id))
                    .add(review::Column::DishId.is_in(dish_ids.clone())),
            )
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let comment_ids: Vec<String> = Comment::find()
            .filter(comment::Column::RestaurantId.eq(id))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|c| c.id)
            .collect();

        ReviewLike::delete_many()
            .filter(review_like::Column::ReviewId.is_in(review_ids.clone()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        Review::delete_many()
            .filter(review::Column::Id.is_in(review_ids.clone()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        CommentReaction::delete_many()
            .filter(comment_reaction::Column::CommentId.is_in(comment_ids.clone()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        CommentReply::delete_many()
            .filter(comment_reply::Column::CommentId.is_in(comment_ids.clone()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        Comment::delete_many()
            .filter(comment::Column::RestaurantId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        Rating::delete_many()
            .filter(rating::Column::RestaurantId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        PostLike::delete_many()
            .filter(post_like::Column::RestaurantId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        RestaurantTag::delete_many()
            .filter(restaurant_tag::Column::RestaurantId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        Dish::delete_many()
            .filter(dish::Column::RestaurantId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        Restaurant::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(
            restaurant_id = %id,
            dishes = dish_ids.len(),
            reviews = review_ids.len(),
            comments = comment_ids.len(),
            "Deleted restaurant"
        );
        Ok(())
    }
}
