//! Tag repository (tags and restaurant-tag links).

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{RestaurantTag, Tag, restaurant_tag, tag};
use riviu_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// List all tags ordered by name.
    pub async fn list(&self) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tag by name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<tag::Model>> {
        Tag::find()
            .filter(tag::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find tags by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<tag::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Tag::find()
            .filter(tag::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new tag.
    pub async fn create(&self, model: tag::ActiveModel) -> AppResult<tag::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Link tags to a restaurant.
    pub async fn link_to_restaurant(&self, restaurant_id: &str, tag_ids: &[String]) -> AppResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let links = tag_ids.iter().map(|tag_id| restaurant_tag::ActiveModel {
            restaurant_id: Set(restaurant_id.to_string()),
            tag_id: Set(tag_id.clone()),
        });

        RestaurantTag::insert_many(links)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Replace the tag set of a restaurant.
    pub async fn replace_for_restaurant(
        &self,
        restaurant_id: &str,
        tag_ids: &[String],
    ) -> AppResult<()> {
        RestaurantTag::delete_many()
            .filter(restaurant_tag::Column::RestaurantId.eq(restaurant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.link_to_restaurant(restaurant_id, tag_ids).await
    }

    /// Tags of several restaurants, keyed by restaurant ID.
    ///
    /// Restaurants without tags are absent from the map.
    pub async fn find_for_restaurants(
        &self,
        restaurant_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<tag::Model>>> {
        if restaurant_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = RestaurantTag::find()
            .filter(restaurant_tag::Column::RestaurantId.is_in(restaurant_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let tag_ids: Vec<String> = links.iter().map(|l| l.tag_id.clone()).collect();
        let tags: HashMap<String, tag::Model> = self
            .find_by_ids(&tag_ids)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let mut result: HashMap<String, Vec<tag::Model>> = HashMap::new();
        for link in links {
            if let Some(tag) = tags.get(&link.tag_id) {
                result
                    .entry(link.restaurant_id)
                    .or_default()
                    .push(tag.clone());
            }
        }
        Ok(result)
    }
}
