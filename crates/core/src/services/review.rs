//! Review service.

use riviu_common::{AppError, AppResult, IdGenerator};
use riviu_db::{
    entities::review,
    repositories::{DishRepository, RestaurantRepository, ReviewRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::services::authz::{Access, Actor, ResourceKind, authorize};
use crate::services::mood::{MoodView, classify_mood};

/// Input for a review. Exactly one of `restaurant_id` and `dish_id` must be set.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    pub restaurant_id: Option<String>,
    pub dish_id: Option<String>,

    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    #[validate(length(min = 1, max = 5000))]
    pub comment: String,
}

/// What a review is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTarget<'a> {
    Restaurant(&'a str),
    Dish(&'a str),
}

impl CreateReviewInput {
    /// The single target of the review.
    pub fn target(&self) -> AppResult<ReviewTarget<'_>> {
        match (self.restaurant_id.as_deref(), self.dish_id.as_deref()) {
            (Some(id), None) => Ok(ReviewTarget::Restaurant(id)),
            (None, Some(id)) => Ok(ReviewTarget::Dish(id)),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "target: a review is about a restaurant or a dish, not both".to_string(),
            )),
            (None, None) => Err(AppError::Validation(
                "target: restaurantId or dishId is required".to_string(),
            )),
        }
    }
}

/// A review with its classified mood.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: review::Model,
    pub mood: MoodView,
}

impl From<review::Model> for ReviewView {
    fn from(review: review::Model) -> Self {
        let mood = classify_mood(&review.comment, Some(review.created_at)).into();
        Self { review, mood }
    }
}

/// Review service for business logic.
#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    restaurant_repo: RestaurantRepository,
    dish_repo: DishRepository,
    id_gen: IdGenerator,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub const fn new(
        review_repo: ReviewRepository,
        restaurant_repo: RestaurantRepository,
        dish_repo: DishRepository,
    ) -> Self {
        Self {
            review_repo,
            restaurant_repo,
            dish_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Write a review of a restaurant or a dish.
    pub async fn create(&self, actor: Option<&Actor>, input: CreateReviewInput) -> AppResult<ReviewView> {
        let actor = authorize(actor, ResourceKind::Review, Access::Create)?;
        input.validate()?;

        match input.target()? {
            ReviewTarget::Restaurant(id) => {
                self.restaurant_repo.get_by_id(id).await?;
            }
            ReviewTarget::Dish(id) => {
                self.dish_repo.get_by_id(id).await?;
            }
        }

        let comment = input.comment.trim().to_string();
        if comment.is_empty() {
            return Err(AppError::Validation("comment: must not be blank".to_string()));
        }

        let model = review::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(actor.user_id.clone()),
            restaurant_id: Set(input.restaurant_id),
            dish_id: Set(input.dish_id),
            rating: Set(input.rating),
            comment: Set(comment),
            created_at: Set(chrono::Utc::now().into()),
        };
        let review = self.review_repo.create(model).await?;
        info!(review_id = %review.id, user_id = %actor.user_id, "Review created");

        Ok(review.into())
    }

    /// Get a review by ID.
    pub async fn get(&self, id: &str) -> AppResult<ReviewView> {
        Ok(self.review_repo.get_by_id(id).await?.into())
    }

    /// Reviews of a restaurant, newest first.
    pub async fn list_for_restaurant(&self, restaurant_id: &str) -> AppResult<Vec<ReviewView>> {
        let reviews = self.review_repo.find_by_restaurant(restaurant_id).await?;
        Ok(reviews.into_iter().map(ReviewView::from).collect())
    }

    /// Reviews of a dish, newest first.
    pub async fn list_for_dish(&self, dish_id: &str) -> AppResult<Vec<ReviewView>> {
        let reviews = self.review_repo.find_by_dish(dish_id).await?;
        Ok(reviews.into_iter().map(ReviewView::from).collect())
    }

    /// Reviews written by a user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<ReviewView>> {
        let reviews = self.review_repo.find_by_user(user_id).await?;
        Ok(reviews.into_iter().map(ReviewView::from).collect())
    }

    /// Delete a review and its likes. Author or admin.
    pub async fn delete(&self, actor: Option<&Actor>, id: &str) -> AppResult<()> {
        let review = self.review_repo.get_by_id(id).await?;
        authorize(
            actor,
            ResourceKind::Review,
            Access::Modify {
                owner_id: &review.user_id,
            },
        )?;

        self.review_repo.delete_cascade(id).await?;
        info!(review_id = %id, "Review deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use riviu_db::entities::{dish, user::Role};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn actor(id: &str, role: Role) -> Actor {
        Actor {
            user_id: id.to_string(),
            role,
        }
    }

    fn review(id: &str, user_id: &str) -> review::Model {
        review::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            restaurant_id: Some("r1".to_string()),
            dish_id: None,
            rating: 5,
            comment: "A romantic dinner".to_string(),
            created_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 2, 14, 21, 0, 0)
                .unwrap(),
        }
    }

    fn input(restaurant_id: Option<&str>, dish_id: Option<&str>) -> CreateReviewInput {
        CreateReviewInput {
            restaurant_id: restaurant_id.map(ToString::to_string),
            dish_id: dish_id.map(ToString::to_string),
            rating: 4,
            comment: "Tasty".to_string(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> ReviewService {
        let db = Arc::new(db);
        ReviewService::new(
            ReviewRepository::new(db.clone()),
            RestaurantRepository::new(db.clone()),
            DishRepository::new(db),
        )
    }

    #[test]
    fn test_target_requires_exactly_one() {
        assert_eq!(
            input(Some("r1"), None).target().unwrap(),
            ReviewTarget::Restaurant("r1")
        );
        assert_eq!(input(None, Some("d1")).target().unwrap(), ReviewTarget::Dish("d1"));
        assert!(matches!(
            input(Some("r1"), Some("d1")).target(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(input(None, None).target(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_view_carries_mood() {
        let review = review("v1", "alice");
        let expected = classify_mood(&review.comment, Some(review.created_at));
        let view = ReviewView::from(review);
        assert_eq!(view.mood.mood, expected);
        assert_eq!(view.mood.label, expected.label());
    }

    #[tokio::test]
    async fn test_create_for_missing_dish() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<dish::Model>::new()])
            .into_connection();

        let result = service(db)
            .create(Some(&actor("alice", Role::User)), input(None, Some("d1")))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_both_targets() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db)
            .create(Some(&actor("alice", Role::User)), input(Some("r1"), Some("d1")))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_admin_deletes_any_review() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[review("v1", "alice")]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let result = service(db)
            .delete(Some(&actor("root", Role::Admin)), "v1")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_stranger_cannot_delete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[review("v1", "alice")]])
            .into_connection();

        let result = service(db)
            .delete(Some(&actor("mallory", Role::User)), "v1")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
