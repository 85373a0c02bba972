//! Dish service. Dishes belong to a restaurant and are managed by its owner.

use riviu_common::{AppError, AppResult, IdGenerator};
use riviu_db::{
    entities::{category::CategoryKind, dish},
    repositories::{CategoryRepository, DishRepository, RestaurantRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::services::authz::{Access, Actor, ResourceKind, authorize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDishInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,

    /// Price in the smallest currency unit.
    #[validate(range(min = 0))]
    pub price: i64,

    #[validate(url)]
    pub image_url: Option<String>,

    pub category_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDishInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 0))]
    pub price: Option<i64>,

    #[validate(url)]
    pub image_url: Option<String>,

    pub category_id: Option<String>,
}

/// Dish service for business logic.
#[derive(Clone)]
pub struct DishService {
    dish_repo: DishRepository,
    restaurant_repo: RestaurantRepository,
    category_repo: CategoryRepository,
    id_gen: IdGenerator,
}

impl DishService {
    /// Create a new dish service.
    #[must_use]
    pub const fn new(
        dish_repo: DishRepository,
        restaurant_repo: RestaurantRepository,
        category_repo: CategoryRepository,
    ) -> Self {
        Self {
            dish_repo,
            restaurant_repo,
            category_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Dishes of a restaurant.
    pub async fn list(&self, restaurant_id: &str) -> AppResult<Vec<dish::Model>> {
        self.restaurant_repo.get_by_id(restaurant_id).await?;
        self.dish_repo.find_by_restaurant(restaurant_id).await
    }

    /// Get a dish by ID.
    pub async fn get(&self, id: &str) -> AppResult<dish::Model> {
        self.dish_repo.get_by_id(id).await
    }

    /// Add a dish to a restaurant. Restaurant owner or admin.
    pub async fn create(
        &self,
        actor: Option<&Actor>,
        restaurant_id: &str,
        input: CreateDishInput,
    ) -> AppResult<dish::Model> {
        let restaurant = self.restaurant_repo.get_by_id(restaurant_id).await?;
        authorize(
            actor,
            ResourceKind::Dish,
            Access::Modify {
                owner_id: &restaurant.owner_id,
            },
        )?;
        input.validate()?;
        if let Some(category_id) = input.category_id.as_deref() {
            self.check_category(category_id).await?;
        }

        let model = dish::ActiveModel {
            id: Set(self.id_gen.generate()),
            restaurant_id: Set(restaurant_id.to_string()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            price: Set(input.price),
            image_url: Set(input.image_url),
            category_id: Set(input.category_id),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };
        let dish = self.dish_repo.create(model).await?;
        info!(dish_id = %dish.id, restaurant_id = %restaurant_id, "Dish created");

        Ok(dish)
    }

    /// Update a dish. Restaurant owner or admin.
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: &str,
        input: UpdateDishInput,
    ) -> AppResult<dish::Model> {
        let dish = self.dish_repo.get_by_id(id).await?;
        self.authorize_owner(actor, &dish).await?;
        input.validate()?;
        if let Some(category_id) = input.category_id.as_deref() {
            self.check_category(category_id).await?;
        }

        let mut active: dish::ActiveModel = dish.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.dish_repo.update(active).await
    }

    /// Delete a dish and its reviews. Restaurant owner or admin.
    pub async fn delete(&self, actor: Option<&Actor>, id: &str) -> AppResult<()> {
        let dish = self.dish_repo.get_by_id(id).await?;
        self.authorize_owner(actor, &dish).await?;

        self.dish_repo.delete_cascade(id).await?;
        info!(dish_id = %id, "Dish deleted");
        Ok(())
    }

    async fn authorize_owner(&self, actor: Option<&Actor>, dish: &dish::Model) -> AppResult<()> {
        let restaurant = self.restaurant_repo.get_by_id(&dish.restaurant_id).await?;
        authorize(
            actor,
            ResourceKind::Dish,
            Access::Modify {
                owner_id: &restaurant.owner_id,
            },
        )?;
        Ok(())
    }

    async fn check_category(&self, id: &str) -> AppResult<()> {
        match self.category_repo.find_by_id(id).await? {
            Some(category) if category.kind == CategoryKind::Dish => Ok(()),
            Some(category) => Err(AppError::Validation(format!(
                "categoryId: {} is not a dish category",
                category.name
            ))),
            None => Err(AppError::Validation(format!("categoryId: unknown category {id}"))),
        }
    }
}
