//! Aggregation service.
//!
//! Combines per-restaurant rating averages/counts and like counts/flags into
//! view-ready summaries.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use riviu_common::AppResult;
use riviu_db::repositories::{LikeRepository, LikeRow, LikeTarget, RatingRepository};
use serde::Serialize;
use tracing::warn;

/// Average score and number of ratings of a restaurant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: u64,
}

/// Like count of a target and whether the viewer is among the likers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSummary {
    pub count: u64,
    pub has_liked: bool,
}

/// Aggregation service for ratings and likes.
#[derive(Clone)]
pub struct AggregationService {
    rating_repo: RatingRepository,
    like_repo: LikeRepository,
}

impl AggregationService {
    /// Create a new aggregation service.
    #[must_use]
    pub const fn new(rating_repo: RatingRepository, like_repo: LikeRepository) -> Self {
        Self {
            rating_repo,
            like_repo,
        }
    }

    /// Rating summary of one restaurant.
    ///
    /// The average comes from the database aggregate; the count is a separate query.
    pub async fn rating_summary(&self, restaurant_id: &str) -> AppResult<RatingSummary> {
        let (average, count) = tokio::try_join!(
            self.rating_repo.average_for_restaurant(restaurant_id),
            self.rating_repo.count_for_restaurant(restaurant_id),
        )?;
        Ok(RatingSummary { average, count })
    }

    /// Rating summaries for several restaurants, fetched concurrently.
    ///
    /// A restaurant whose summary cannot be fetched is reported as unrated.
    pub async fn rating_summaries(&self, restaurant_ids: &[String]) -> HashMap<String, RatingSummary> {
        let fetches = restaurant_ids.iter().map(|id| async move {
            let summary = match self.rating_summary(id).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(restaurant_id = %id, error = %e, "Failed to fetch rating summary");
                    RatingSummary::default()
                }
            };
            (id.clone(), summary)
        });

        join_all(fetches).await.into_iter().collect()
    }

    /// Like summaries for a batch of targets.
    ///
    /// One query fetches every like on the batch, one fetches the viewer's own likes,
    /// and the two are joined locally.
    pub async fn like_summaries(
        &self,
        target: LikeTarget,
        target_ids: &[String],
        viewer_id: Option<&str>,
    ) -> AppResult<HashMap<String, LikeSummary>> {
        let all_likes = self.like_repo.find_for_targets(target, target_ids).await?;
        let viewer_likes = match viewer_id {
            Some(viewer_id) => {
                self.like_repo
                    .find_for_targets_by_user(target, target_ids, viewer_id)
                    .await?
            }
            None => vec![],
        };

        Ok(join_like_summaries(target_ids, &all_likes, &viewer_likes))
    }
}

/// Join like rows into per-target summaries.
///
/// Every requested ID gets an entry; IDs without likes get `{0, false}`.
#[must_use]
pub fn join_like_summaries(
    target_ids: &[String],
    all_likes: &[LikeRow],
    viewer_likes: &[LikeRow],
) -> HashMap<String, LikeSummary> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for like in all_likes {
        *counts.entry(like.target_id.as_str()).or_default() += 1;
    }
    let liked: HashSet<&str> = viewer_likes.iter().map(|l| l.target_id.as_str()).collect();

    target_ids
        .iter()
        .map(|id| {
            let summary = LikeSummary {
                count: counts.get(id.as_str()).copied().unwrap_or(0),
                has_liked: liked.contains(id.as_str()),
            };
            (id.clone(), summary)
        })
        .collect()
}
