//! Review feed.
//!
//! [`FeedService`] assembles restaurant reviews with their restaurant card, rating
//! summary, like summaries and mood. [`FeedView`] is the client-side view-model that
//! holds a loaded feed and applies the results of user actions to it.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset};
use riviu_common::AppResult;
use riviu_db::{
    entities::{category, restaurant, review, tag},
    repositories::{
        CategoryRepository, LikeTarget, RestaurantFilter, RestaurantRepository, ReviewRepository,
        TagRepository,
    },
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::aggregation::{AggregationService, LikeSummary, RatingSummary};
use crate::services::comment::CommentThread;
use crate::services::mood::{MoodView, classify_mood};
use crate::services::search::{SearchOutcome, Searchable};

/// Default number of reviews loaded into the feed.
pub const DEFAULT_FEED_LIMIT: u64 = 100;

/// The restaurant a feed entry is about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantCard {
    pub id: String,
    pub name: String,
    pub address: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// One review in the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub review_id: String,
    pub user_id: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<FixedOffset>,
    pub restaurant: RestaurantCard,
    pub restaurant_rating: RatingSummary,
    pub restaurant_likes: LikeSummary,
    pub review_likes: LikeSummary,
    pub mood: MoodView,
}

impl Searchable for FeedEntry {
    fn search_fields(&self) -> Vec<&str> {
        let card = &self.restaurant;
        let mut fields = vec![
            card.name.as_str(),
            card.address.as_str(),
            card.description.as_str(),
        ];
        if let Some(category) = &card.category {
            fields.push(category);
        }
        fields.extend(card.tags.iter().map(String::as_str));
        fields
    }
}

/// Order entries by restaurant average rating (highest first), then newest first.
pub fn sort_feed(entries: &mut [FeedEntry]) {
    entries.sort_by(|a, b| compare_entries(a, b));
}

fn compare_entries(a: &FeedEntry, b: &FeedEntry) -> Ordering {
    b.restaurant_rating
        .average
        .total_cmp(&a.restaurant_rating.average)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Feed query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    /// Only reviews of restaurants in the category with this name.
    pub category: Option<String>,
    pub limit: Option<u64>,
}

/// Feed service.
#[derive(Clone)]
pub struct FeedService {
    review_repo: ReviewRepository,
    restaurant_repo: RestaurantRepository,
    category_repo: CategoryRepository,
    tag_repo: TagRepository,
    aggregation: AggregationService,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(
        review_repo: ReviewRepository,
        restaurant_repo: RestaurantRepository,
        category_repo: CategoryRepository,
        tag_repo: TagRepository,
        aggregation: AggregationService,
    ) -> Self {
        Self {
            review_repo,
            restaurant_repo,
            category_repo,
            tag_repo,
            aggregation,
        }
    }

    /// Load the review feed, sorted by restaurant rating then recency.
    pub async fn load(&self, query: &FeedQuery, viewer_id: Option<&str>) -> AppResult<Vec<FeedEntry>> {
        let limit = query.limit.unwrap_or(DEFAULT_FEED_LIMIT).min(DEFAULT_FEED_LIMIT);

        let reviews = match query.category.as_deref().filter(|c| !c.is_empty()) {
            Some(name) => {
                let Some(category) = self.category_repo.find_by_name(name).await? else {
                    debug!(category = %name, "Feed requested for unknown category");
                    return Ok(vec![]);
                };
                let filter = RestaurantFilter {
                    category_id: Some(category.id),
                    name_contains: None,
                };
                let ids: Vec<String> = self
                    .restaurant_repo
                    .list(&filter)
                    .await?
                    .into_iter()
                    .map(|r| r.id)
                    .collect();
                if ids.is_empty() {
                    return Ok(vec![]);
                }
                self.review_repo
                    .find_restaurant_reviews(Some(&ids), limit)
                    .await?
            }
            None => self.review_repo.find_restaurant_reviews(None, limit).await?,
        };

        let restaurant_ids: Vec<String> = reviews
            .iter()
            .filter_map(|r| r.restaurant_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let review_ids: Vec<String> = reviews.iter().map(|r| r.id.clone()).collect();

        let restaurants: HashMap<String, restaurant::Model> = self
            .restaurant_repo
            .find_by_ids(&restaurant_ids)
            .await?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        let category_ids: Vec<String> = restaurants
            .values()
            .filter_map(|r| r.category_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let categories: HashMap<String, category::Model> = self
            .category_repo
            .find_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        let tags = self.tag_repo.find_for_restaurants(&restaurant_ids).await?;

        let ratings = self.aggregation.rating_summaries(&restaurant_ids).await;
        let restaurant_likes = self
            .aggregation
            .like_summaries(LikeTarget::Restaurant, &restaurant_ids, viewer_id)
            .await?;
        let review_likes = self
            .aggregation
            .like_summaries(LikeTarget::Review, &review_ids, viewer_id)
            .await?;

        let mut entries: Vec<FeedEntry> = reviews
            .into_iter()
            .filter_map(|review| {
                let restaurant = restaurants.get(review.restaurant_id.as_deref()?)?;
                let card = restaurant_card(restaurant, &categories, tags.get(&restaurant.id));
                Some(build_entry(
                    review,
                    card,
                    ratings.get(&restaurant.id).copied().unwrap_or_default(),
                    restaurant_likes.get(&restaurant.id).copied().unwrap_or_default(),
                    &review_likes,
                ))
            })
            .collect();

        sort_feed(&mut entries);
        Ok(entries)
    }
}

fn restaurant_card(
    restaurant: &restaurant::Model,
    categories: &HashMap<String, category::Model>,
    tags: Option<&Vec<tag::Model>>,
) -> RestaurantCard {
    RestaurantCard {
        id: restaurant.id.clone(),
        name: restaurant.name.clone(),
        address: restaurant.address.clone(),
        description: restaurant.description.clone(),
        image_url: restaurant.image_url.clone(),
        category: restaurant
            .category_id
            .as_ref()
            .and_then(|id| categories.get(id))
            .map(|c| c.name.clone()),
        tags: tags
            .map(|tags| tags.iter().map(|t| t.name.clone()).collect())
            .unwrap_or_default(),
    }
}

fn build_entry(
    review: review::Model,
    restaurant: RestaurantCard,
    restaurant_rating: RatingSummary,
    restaurant_likes: LikeSummary,
    review_likes: &HashMap<String, LikeSummary>,
) -> FeedEntry {
    let mood = classify_mood(&review.comment, Some(review.created_at)).into();
    FeedEntry {
        review_likes: review_likes.get(&review.id).copied().unwrap_or_default(),
        review_id: review.id,
        user_id: review.user_id,
        rating: review.rating,
        comment: review.comment,
        created_at: review.created_at,
        restaurant,
        restaurant_rating,
        restaurant_likes,
        mood,
    }
}

/// Client-side state of a loaded feed.
///
/// Holds the loaded entries, the latest search outcome and the comment threads that
/// have been opened, and folds the results of user actions back into them.
#[derive(Debug, Default)]
pub struct FeedView {
    entries: Vec<FeedEntry>,
    search: SearchOutcome<FeedEntry>,
    threads: HashMap<String, Vec<CommentThread>>,
}

impl FeedView {
    /// Create a view over loaded entries.
    #[must_use]
    pub fn new(mut entries: Vec<FeedEntry>) -> Self {
        sort_feed(&mut entries);
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Every loaded entry.
    #[must_use]
    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    /// Current search query.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.search.query
    }

    /// Entries to display: search results while a query is active, else everything.
    #[must_use]
    pub fn visible(&self) -> &[FeedEntry] {
        if self.search.query.trim().is_empty() {
            &self.entries
        } else {
            &self.search.results
        }
    }

    /// Adopt the outcome of a search pass.
    pub fn apply_search(&mut self, outcome: SearchOutcome<FeedEntry>) {
        self.search = outcome;
    }

    /// Reflect a restaurant like toggle.
    pub fn apply_restaurant_like(&mut self, restaurant_id: &str, likes: LikeSummary) {
        self.for_each_entry(|e| {
            if e.restaurant.id == restaurant_id {
                e.restaurant_likes = likes;
            }
        });
    }

    /// Reflect a review like toggle.
    pub fn apply_review_like(&mut self, review_id: &str, likes: LikeSummary) {
        self.for_each_entry(|e| {
            if e.review_id == review_id {
                e.review_likes = likes;
            }
        });
    }

    /// Reflect a new rating summary and restore the feed order.
    pub fn apply_rating(&mut self, restaurant_id: &str, rating: RatingSummary) {
        self.for_each_entry(|e| {
            if e.restaurant.id == restaurant_id {
                e.restaurant_rating = rating;
            }
        });
        sort_feed(&mut self.entries);
        sort_feed(&mut self.search.results);
    }

    /// Store the comment threads fetched for a restaurant.
    pub fn apply_comments(&mut self, restaurant_id: &str, threads: Vec<CommentThread>) {
        self.threads.insert(restaurant_id.to_string(), threads);
    }

    /// Comment threads of a restaurant, if they have been loaded.
    #[must_use]
    pub fn comments(&self, restaurant_id: &str) -> Option<&[CommentThread]> {
        self.threads.get(restaurant_id).map(Vec::as_slice)
    }

    /// Drop a deleted review.
    pub fn remove_review(&mut self, review_id: &str) {
        self.entries.retain(|e| e.review_id != review_id);
        self.search.results.retain(|e| e.review_id != review_id);
    }

    /// Drop every entry of a deleted restaurant.
    pub fn remove_restaurant(&mut self, restaurant_id: &str) {
        self.entries.retain(|e| e.restaurant.id != restaurant_id);
        self.search.results.retain(|e| e.restaurant.id != restaurant_id);
        self.threads.remove(restaurant_id);
    }

    fn for_each_entry(&mut self, mut f: impl FnMut(&mut FeedEntry)) {
        self.entries.iter_mut().for_each(&mut f);
        self.search.results.iter_mut().for_each(&mut f);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::mood::Mood;
    use crate::services::search::filter_items;
    use chrono::TimeZone;

    fn entry(review_id: &str, restaurant_id: &str, average: f64, hour: u32) -> FeedEntry {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, hour, 0, 0)
            .unwrap();
        FeedEntry {
            review_id: review_id.to_string(),
            user_id: "u1".to_string(),
            rating: 4,
            comment: "Nice".to_string(),
            created_at: ts,
            restaurant: RestaurantCard {
                id: restaurant_id.to_string(),
                name: format!("Restaurant {restaurant_id}"),
                address: "1 Main St".to_string(),
                description: "Food".to_string(),
                image_url: None,
                category: Some("Italian".to_string()),
                tags: vec!["pasta".to_string()],
            },
            restaurant_rating: RatingSummary {
                average,
                count: 1,
            },
            restaurant_likes: LikeSummary::default(),
            review_likes: LikeSummary::default(),
            mood: Mood::Cozy.into(),
        }
    }

    fn ids(entries: &[FeedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.review_id.as_str()).collect()
    }

    #[test]
    fn test_sort_by_average_then_recency() {
        let mut entries = vec![
            entry("a", "r1", 3.0, 10),
            entry("b", "r2", 4.5, 8),
            entry("c", "r1", 3.0, 12),
            entry("d", "r3", 0.0, 23),
        ];
        sort_feed(&mut entries);
        assert_eq!(ids(&entries), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_search_matches_category_and_tags() {
        let mut tagged = entry("a", "r1", 3.0, 10);
        tagged.restaurant.tags = vec!["Vegan".to_string()];
        tagged.restaurant.category = None;
        let plain = entry("b", "r2", 3.0, 10);

        let entries = vec![tagged, plain];
        assert_eq!(ids(&filter_items("vegan", &entries)), vec!["a"]);
        assert_eq!(ids(&filter_items("italian", &entries)), vec!["b"]);
        assert!(filter_items("", &entries).is_empty());
    }

    #[test]
    fn test_view_shows_everything_without_query() {
        let view = FeedView::new(vec![entry("a", "r1", 3.0, 10), entry("b", "r2", 4.0, 10)]);
        assert_eq!(ids(view.visible()), vec!["b", "a"]);
    }

    #[test]
    fn test_view_applies_search_and_like_to_results() {
        let mut view = FeedView::new(vec![entry("a", "r1", 3.0, 10), entry("b", "r2", 4.0, 10)]);
        let results = filter_items("Restaurant r1", view.entries());
        view.apply_search(SearchOutcome {
            query: "Restaurant r1".to_string(),
            results,
        });
        assert_eq!(ids(view.visible()), vec!["a"]);

        let liked = LikeSummary {
            count: 1,
            has_liked: true,
        };
        view.apply_restaurant_like("r1", liked);
        assert_eq!(view.visible()[0].restaurant_likes, liked);
        assert_eq!(
            view.entries()
                .iter()
                .find(|e| e.review_id == "a")
                .unwrap()
                .restaurant_likes,
            liked
        );
    }

    #[test]
    fn test_view_rating_update_reorders() {
        let mut view = FeedView::new(vec![entry("a", "r1", 3.0, 10), entry("b", "r2", 4.0, 10)]);
        view.apply_rating(
            "r1",
            RatingSummary {
                average: 5.0,
                count: 2,
            },
        );
        assert_eq!(ids(view.visible()), vec!["a", "b"]);
    }

    #[test]
    fn test_view_remove_restaurant() {
        let mut view = FeedView::new(vec![
            entry("a", "r1", 3.0, 10),
            entry("b", "r2", 4.0, 10),
            entry("c", "r1", 3.0, 11),
        ]);
        view.apply_comments("r1", vec![]);
        view.remove_restaurant("r1");

        assert_eq!(ids(view.visible()), vec!["b"]);
        assert!(view.comments("r1").is_none());
    }

    fn feed_service(db: sea_orm::DatabaseConnection) -> FeedService {
        use riviu_db::repositories::{LikeRepository, RatingRepository};
        use std::sync::Arc;

        let db = Arc::new(db);
        FeedService::new(
            ReviewRepository::new(db.clone()),
            RestaurantRepository::new(db.clone()),
            CategoryRepository::new(db.clone()),
            TagRepository::new(db.clone()),
            AggregationService::new(RatingRepository::new(db.clone()), LikeRepository::new(db)),
        )
    }

    #[tokio::test]
    async fn test_load_unknown_category_is_empty() {
        use sea_orm::{DatabaseBackend, MockDatabase};

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<category::Model>::new()])
            .into_connection();
        let query = FeedQuery {
            category: Some("Martian".to_string()),
            limit: None,
        };

        let entries = feed_service(db).load(&query, None).await.unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_load_assembles_entries() {
        use chrono::Utc;
        use riviu_db::entities::{category::CategoryKind, post_like, restaurant_tag, review_like};
        use sea_orm::{DatabaseBackend, MockDatabase};

        let review = review::Model {
            id: "v1".to_string(),
            user_id: "u1".to_string(),
            restaurant_id: Some("r1".to_string()),
            dish_id: None,
            rating: 5,
            comment: "Great place to work".to_string(),
            created_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
                .unwrap(),
        };
        let restaurant = restaurant::Model {
            id: "r1".to_string(),
            owner_id: "u1".to_string(),
            name: "Pasta Palace".to_string(),
            address: "1 Main St".to_string(),
            description: "Fresh pasta".to_string(),
            phone: None,
            image_url: None,
            category_id: Some("c1".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        };
        let category = category::Model {
            id: "c1".to_string(),
            name: "Italian".to_string(),
            kind: CategoryKind::Restaurant,
            description: None,
            created_at: Utc::now().into(),
        };
        let link = restaurant_tag::Model {
            restaurant_id: "r1".to_string(),
            tag_id: "t1".to_string(),
        };
        let tag = tag::Model {
            id: "t1".to_string(),
            name: "pasta".to_string(),
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[review]])
            .append_query_results([[restaurant]])
            .append_query_results([[category]])
            .append_query_results([[link]])
            .append_query_results([[tag]])
            .append_query_results([[maplit::btreemap! {
                "average" => sea_orm::Value::Double(Some(4.5))
            }]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(2))
            }]])
            .append_query_results([Vec::<post_like::Model>::new()])
            .append_query_results([Vec::<review_like::Model>::new()])
            .into_connection();

        let entries = feed_service(db)
            .load(&FeedQuery::default(), None)
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.restaurant.category.as_deref(), Some("Italian"));
        assert_eq!(entry.restaurant.tags, vec!["pasta".to_string()]);
        assert_eq!(entry.restaurant_rating.average, 4.5);
        assert_eq!(entry.restaurant_likes, LikeSummary::default());
        assert_eq!(
            entry.mood.mood,
            classify_mood("Great place to work", Some(entry.created_at))
        );
    }

    #[test]
    fn test_view_remove_review() {
        let mut view = FeedView::new(vec![entry("a", "r1", 3.0, 10), entry("b", "r2", 4.0, 10)]);
        view.remove_review("b");
        assert_eq!(ids(view.entries()), vec!["a"]);
    }
}
