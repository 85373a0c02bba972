//! Rating service.

use riviu_common::{AppResult, IdGenerator};
use riviu_db::repositories::{RatingRepository, RestaurantRepository};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::services::aggregation::{AggregationService, RatingSummary};
use crate::services::authz::{Access, Actor, ResourceKind, authorize};

/// Input for rating a restaurant.
#[derive(Debug, Deserialize, Validate)]
pub struct RateInput {
    #[validate(range(min = 1, max = 5))]
    pub score: i32,
}

/// Rating summary plus the viewer's own score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub average: f64,
    pub count: u64,
    pub my_score: Option<i32>,
}

impl RatingView {
    fn new(summary: RatingSummary, my_score: Option<i32>) -> Self {
        Self {
            average: summary.average,
            count: summary.count,
            my_score,
        }
    }
}

/// Rating service for business logic.
#[derive(Clone)]
pub struct RatingService {
    rating_repo: RatingRepository,
    restaurant_repo: RestaurantRepository,
    aggregation: AggregationService,
    id_gen: IdGenerator,
}

impl RatingService {
    /// Create a new rating service.
    #[must_use]
    pub const fn new(
        rating_repo: RatingRepository,
        restaurant_repo: RestaurantRepository,
        aggregation: AggregationService,
    ) -> Self {
        Self {
            rating_repo,
            restaurant_repo,
            aggregation,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record the user's score, replacing any earlier score for the restaurant.
    pub async fn rate(
        &self,
        actor: Option<&Actor>,
        restaurant_id: &str,
        input: RateInput,
    ) -> AppResult<RatingView> {
        let user_id = authorize(actor, ResourceKind::Rating, Access::Create)?
            .user_id
            .as_str();
        input.validate()?;
        self.restaurant_repo.get_by_id(restaurant_id).await?;

        self.rating_repo
            .upsert(self.id_gen.generate(), restaurant_id, user_id, input.score)
            .await?;
        debug!(restaurant_id = %restaurant_id, user_id = %user_id, score = input.score, "Rating recorded");

        let summary = self.aggregation.rating_summary(restaurant_id).await?;
        Ok(RatingView::new(summary, Some(input.score)))
    }

    /// Rating summary of a restaurant, with the viewer's score when signed in.
    pub async fn summary(&self, restaurant_id: &str, viewer_id: Option<&str>) -> AppResult<RatingView> {
        let summary = self.aggregation.rating_summary(restaurant_id).await?;
        let my_score = match viewer_id {
            Some(viewer_id) => self
                .rating_repo
                .find_by_user_and_restaurant(viewer_id, restaurant_id)
                .await?
                .map(|r| r.score),
            None => None,
        };
        Ok(RatingView::new(summary, my_score))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use riviu_common::AppError;
    use riviu_db::entities::{rating, restaurant, user::Role};
    use riviu_db::repositories::LikeRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn actor(id: &str) -> Actor {
        Actor {
            user_id: id.to_string(),
            role: Role::User,
        }
    }

    fn restaurant(id: &str) -> restaurant::Model {
        restaurant::Model {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            name: "Pasta Palace".to_string(),
            address: "1 Main St".to_string(),
            description: "Fresh pasta".to_string(),
            phone: None,
            image_url: None,
            category_id: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> RatingService {
        let db = Arc::new(db);
        let aggregation = AggregationService::new(
            RatingRepository::new(db.clone()),
            LikeRepository::new(db.clone()),
        );
        RatingService::new(
            RatingRepository::new(db.clone()),
            RestaurantRepository::new(db),
            aggregation,
        )
    }

    #[tokio::test]
    async fn test_rate_rejects_out_of_range() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let svc = service(db);

        for score in [0, 6] {
            let result = svc.rate(Some(&actor("u1")), "r1", RateInput { score }).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_rate_requires_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).rate(None, "r1", RateInput { score: 4 }).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_rate_returns_new_summary() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[restaurant("r1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[maplit::btreemap! {
                "average" => sea_orm::Value::Double(Some(4.0))
            }]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1))
            }]])
            .into_connection();

        let view = service(db)
            .rate(Some(&actor("u1")), "r1", RateInput { score: 4 })
            .await
            .unwrap();

        assert_eq!(
            view,
            RatingView {
                average: 4.0,
                count: 1,
                my_score: Some(4)
            }
        );
    }

    #[tokio::test]
    async fn test_summary_includes_viewer_score() {
        let mine = rating::Model {
            id: "rt1".to_string(),
            restaurant_id: "r1".to_string(),
            user_id: "u1".to_string(),
            score: 2,
            created_at: Utc::now().into(),
            updated_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "average" => sea_orm::Value::Double(Some(3.0))
            }]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(2))
            }]])
            .append_query_results([[mine]])
            .into_connection();

        let view = service(db).summary("r1", Some("u1")).await.unwrap();

        assert_eq!(view.my_score, Some(2));
        assert_eq!(view.count, 2);
    }
}
