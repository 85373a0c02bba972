//! Like service for restaurants and reviews.

use riviu_common::{AppResult, IdGenerator};
use riviu_db::repositories::{LikeRepository, LikeTarget, RestaurantRepository, ReviewRepository};
use tracing::debug;

use crate::services::aggregation::LikeSummary;
use crate::services::authz::{Access, Actor, ResourceKind, authorize};

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    restaurant_repo: RestaurantRepository,
    review_repo: ReviewRepository,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        restaurant_repo: RestaurantRepository,
        review_repo: ReviewRepository,
    ) -> Self {
        Self {
            like_repo,
            restaurant_repo,
            review_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Like the target if the user has not liked it yet, otherwise remove the like.
    ///
    /// Returns the target's like summary after the toggle.
    pub async fn toggle(
        &self,
        actor: Option<&Actor>,
        target: LikeTarget,
        target_id: &str,
    ) -> AppResult<LikeSummary> {
        let actor = authorize(actor, ResourceKind::Like, Access::Create)?;
        let user_id = actor.user_id.as_str();
        match target {
            LikeTarget::Restaurant => {
                self.restaurant_repo.get_by_id(target_id).await?;
            }
            LikeTarget::Review => {
                self.review_repo.get_by_id(target_id).await?;
            }
        }

        let has_liked = match self.like_repo.find(target, target_id, user_id).await? {
            Some(existing) => {
                authorize(
                    Some(actor),
                    ResourceKind::Like,
                    Access::Modify {
                        owner_id: &existing.user_id,
                    },
                )?;
                self.like_repo.delete(target, &existing.id).await?;
                false
            }
            None => {
                self.like_repo
                    .create(target, self.id_gen.generate(), target_id, user_id)
                    .await?;
                true
            }
        };
        debug!(?target, target_id = %target_id, user_id = %user_id, has_liked, "Like toggled");

        let count = self.like_repo.count(target, target_id).await?;
        Ok(LikeSummary { count, has_liked })
    }

    /// Like summary of a single target.
    pub async fn summary(
        &self,
        target: LikeTarget,
        target_id: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<LikeSummary> {
        let count = self.like_repo.count(target, target_id).await?;
        let has_liked = match viewer_id {
            Some(viewer_id) => self
                .like_repo
                .find(target, target_id, viewer_id)
                .await?
                .is_some(),
            None => false,
        };
        Ok(LikeSummary { count, has_liked })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use riviu_common::AppError;
    use riviu_db::entities::{post_like, restaurant, user::Role};
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

    fn like(id: &str) -> post_like::Model {
        post_like::Model {
            id: id.to_string(),
            restaurant_id: "r1".to_string(),
            user_id: "u1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> LikeService {
        let db = Arc::new(db);
        LikeService::new(
            LikeRepository::new(db.clone()),
            RestaurantRepository::new(db.clone()),
            ReviewRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_toggle_adds_like() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[restaurant("r1")]])
            .append_query_results([Vec::<post_like::Model>::new()])
            .append_query_results([[like("l1")]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(3))
            }]])
            .into_connection();

        let summary = service(db)
            .toggle(Some(&actor("u1")), LikeTarget::Restaurant, "r1")
            .await
            .unwrap();

        assert_eq!(
            summary,
            LikeSummary {
                count: 3,
                has_liked: true
            }
        );
    }

    #[tokio::test]
    async fn test_toggle_removes_existing_like() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[restaurant("r1")]])
            .append_query_results([[like("l1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(2))
            }]])
            .into_connection();

        let summary = service(db)
            .toggle(Some(&actor("u1")), LikeTarget::Restaurant, "r1")
            .await
            .unwrap();

        assert_eq!(
            summary,
            LikeSummary {
                count: 2,
                has_liked: false
            }
        );
    }

    #[tokio::test]
    async fn test_toggle_unknown_restaurant() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<restaurant::Model>::new()])
            .into_connection();

        let result = service(db)
            .toggle(Some(&actor("u1")), LikeTarget::Restaurant, "missing")
            .await;

        assert!(matches!(result, Err(AppError::RestaurantNotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_requires_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).toggle(None, LikeTarget::Restaurant, "r1").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_double_toggle_restores_summary() {
        let count = |n: i64| {
            [[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(n))
            }]]
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // summary before
            .append_query_results(count(2))
            .append_query_results([Vec::<post_like::Model>::new()])
            // first toggle adds
            .append_query_results([[restaurant("r1")]])
            .append_query_results([Vec::<post_like::Model>::new()])
            .append_query_results([[like("l1")]])
            .append_query_results(count(3))
            // second toggle removes
            .append_query_results([[restaurant("r1")]])
            .append_query_results([[like("l1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results(count(2))
            .into_connection();
        let service = service(db);
        let alice = actor("u1");

        let before = service
            .summary(LikeTarget::Restaurant, "r1", Some("u1"))
            .await
            .unwrap();
        let liked = service
            .toggle(Some(&alice), LikeTarget::Restaurant, "r1")
            .await
            .unwrap();
        let after = service
            .toggle(Some(&alice), LikeTarget::Restaurant, "r1")
            .await
            .unwrap();

        assert!(liked.has_liked);
        assert_eq!(liked.count, before.count + 1);
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_summary_anonymous() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(5))
            }]])
            .into_connection();

        let summary = service(db)
            .summary(LikeTarget::Restaurant, "r1", None)
            .await
            .unwrap();

        assert_eq!(summary.count, 5);
        assert!(!summary.has_liked);
    }
}
