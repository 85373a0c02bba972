//! Restaurant service.

use std::collections::HashMap;

use riviu_common::{AppError, AppResult, IdGenerator};
use riviu_db::{
    entities::{
        category::{self, CategoryKind},
        restaurant, review, tag,
    },
    repositories::{
        CategoryRepository, RestaurantFilter, RestaurantRepository, ReviewRepository, TagRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::services::authz::{Access, Actor, ResourceKind, authorize};

/// A restaurant with its category and tags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantView {
    #[serde(flatten)]
    pub restaurant: restaurant::Model,
    pub category: Option<category::Model>,
    pub tags: Vec<tag::Model>,
}

/// Restaurant listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestaurantListQuery {
    /// Category name.
    pub category: Option<String>,
    /// Name keyword, case-insensitive.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1, max = 300))]
    pub address: String,

    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,

    pub category_id: Option<String>,

    #[serde(default)]
    pub tag_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRestaurantInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 300))]
    pub address: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    #[validate(url)]
    pub image_url: Option<String>,

    pub category_id: Option<String>,

    /// Replaces the whole tag set when present.
    pub tag_ids: Option<Vec<String>>,
}

/// A new restaurant together with its first review.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    #[serde(flatten)]
    pub restaurant: CreateRestaurantInput,

    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    #[validate(length(min = 1, max = 5000))]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedPost {
    pub restaurant: RestaurantView,
    pub review: review::Model,
}

/// Restaurant service for business logic.
#[derive(Clone)]
pub struct RestaurantService {
    restaurant_repo: RestaurantRepository,
    category_repo: CategoryRepository,
    tag_repo: TagRepository,
    review_repo: ReviewRepository,
    id_gen: IdGenerator,
}

impl RestaurantService {
    /// Create a new restaurant service.
    #[must_use]
    pub const fn new(
        restaurant_repo: RestaurantRepository,
        category_repo: CategoryRepository,
        tag_repo: TagRepository,
        review_repo: ReviewRepository,
    ) -> Self {
        Self {
            restaurant_repo,
            category_repo,
            tag_repo,
            review_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List restaurants, newest first.
    ///
    /// An unknown category name yields an empty list.
    pub async fn list(&self, query: &RestaurantListQuery) -> AppResult<Vec<RestaurantView>> {
        let mut filter = RestaurantFilter {
            category_id: None,
            name_contains: query.q.clone(),
        };

        if let Some(name) = query.category.as_deref().filter(|c| !c.is_empty()) {
            match self.category_repo.find_by_name(name).await? {
                Some(category) => filter.category_id = Some(category.id),
                None => return Ok(vec![]),
            }
        }

        let restaurants = self.restaurant_repo.list(&filter).await?;
        self.views(restaurants).await
    }

    /// Get a restaurant with its category and tags.
    pub async fn get(&self, id: &str) -> AppResult<RestaurantView> {
        let restaurant = self.restaurant_repo.get_by_id(id).await?;
        let mut views = self.views(vec![restaurant]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::RestaurantNotFound(id.to_string()))
    }

    /// Restaurants created by a user.
    pub async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<RestaurantView>> {
        let restaurants = self.restaurant_repo.find_by_owner(owner_id).await?;
        self.views(restaurants).await
    }

    /// Create a restaurant owned by the actor. Tag links are inserted after the row.
    pub async fn create(
        &self,
        actor: Option<&Actor>,
        input: CreateRestaurantInput,
    ) -> AppResult<RestaurantView> {
        let actor = authorize(actor, ResourceKind::Restaurant, Access::Create)?;
        input.validate()?;

        let category = match input.category_id.as_deref() {
            Some(id) => Some(self.restaurant_category(id).await?),
            None => None,
        };
        let tags = self.existing_tags(&input.tag_ids).await?;

        let model = restaurant::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(actor.user_id.clone()),
            name: Set(input.name.trim().to_string()),
            address: Set(input.address.trim().to_string()),
            description: Set(input.description),
            phone: Set(input.phone),
            image_url: Set(input.image_url),
            category_id: Set(input.category_id),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };
        let restaurant = self.restaurant_repo.create(model).await?;

        let tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
        self.tag_repo.link_to_restaurant(&restaurant.id, &tag_ids).await?;
        info!(restaurant_id = %restaurant.id, owner_id = %actor.user_id, "Restaurant created");

        Ok(RestaurantView {
            restaurant,
            category,
            tags,
        })
    }

    /// Create a restaurant, its tag links and an initial review.
    pub async fn create_post(&self, actor: Option<&Actor>, input: CreatePostInput) -> AppResult<CreatedPost> {
        let author = authorize(actor, ResourceKind::Review, Access::Create)?;
        input.validate()?;

        let restaurant = self.create(actor, input.restaurant).await?;

        let model = review::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(author.user_id.clone()),
            restaurant_id: Set(Some(restaurant.restaurant.id.clone())),
            dish_id: Set(None),
            rating: Set(input.rating),
            comment: Set(input.comment.trim().to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        let review = self.review_repo.create(model).await?;

        Ok(CreatedPost { restaurant, review })
    }

    /// Update a restaurant. Owner or admin.
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: &str,
        input: UpdateRestaurantInput,
    ) -> AppResult<RestaurantView> {
        let restaurant = self.restaurant_repo.get_by_id(id).await?;
        authorize(
            actor,
            ResourceKind::Restaurant,
            Access::Modify {
                owner_id: &restaurant.owner_id,
            },
        )?;
        input.validate()?;

        if let Some(category_id) = input.category_id.as_deref() {
            self.restaurant_category(category_id).await?;
        }
        let tags = match &input.tag_ids {
            Some(tag_ids) => Some(self.existing_tags(tag_ids).await?),
            None => None,
        };

        let mut active: restaurant::ActiveModel = restaurant.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(address) = input.address {
            active.address = Set(address.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let restaurant = self.restaurant_repo.update(active).await?;
        if let Some(tags) = tags {
            let tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
            self.tag_repo
                .replace_for_restaurant(&restaurant.id, &tag_ids)
                .await?;
        }

        self.get(&restaurant.id).await
    }

    /// Delete a restaurant and everything attached to it. Owner or admin.
    pub async fn delete(&self, actor: Option<&Actor>, id: &str) -> AppResult<()> {
        let restaurant = self.restaurant_repo.get_by_id(id).await?;
        authorize(
            actor,
            ResourceKind::Restaurant,
            Access::Modify {
                owner_id: &restaurant.owner_id,
            },
        )?;

        self.restaurant_repo.delete_cascade(id).await
    }

    async fn restaurant_category(&self, id: &str) -> AppResult<category::Model> {
        let category = self
            .category_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("categoryId: unknown category {id}")))?;
        if category.kind != CategoryKind::Restaurant {
            return Err(AppError::Validation(format!(
                "categoryId: {} is not a restaurant category",
                category.name
            )));
        }
        Ok(category)
    }

    async fn existing_tags(&self, tag_ids: &[String]) -> AppResult<Vec<tag::Model>> {
        let tags = self.tag_repo.find_by_ids(tag_ids).await?;
        if let Some(missing) = tag_ids.iter().find(|id| !tags.iter().any(|t| &t.id == *id)) {
            return Err(AppError::Validation(format!("tagIds: unknown tag {missing}")));
        }
        Ok(tags)
    }

    async fn views(&self, restaurants: Vec<restaurant::Model>) -> AppResult<Vec<RestaurantView>> {
        let ids: Vec<String> = restaurants.iter().map(|r| r.id.clone()).collect();
        let category_ids: Vec<String> = restaurants
            .iter()
            .filter_map(|r| r.category_id.clone())
            .collect();

        let categories: HashMap<String, category::Model> = self
            .category_repo
            .find_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        let mut tags = self.tag_repo.find_for_restaurants(&ids).await?;

        Ok(restaurants
            .into_iter()
            .map(|restaurant| RestaurantView {
                category: restaurant
                    .category_id
                    .as_ref()
                    .and_then(|id| categories.get(id))
                    .cloned(),
                tags: tags.remove(&restaurant.id).unwrap_or_default(),
                restaurant,
            })
            .collect())
    }
}
