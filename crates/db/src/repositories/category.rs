//! Category repository.

use std::sync::Arc;

use crate::entities::{Category, category, category::CategoryKind};
use riviu_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a category by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<category::Model>> {
        Category::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a category by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<category::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {id}")))
    }

    /// Find a category by its (unique) name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<category::Model>> {
        Category::find()
            .filter(category::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find categories by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<category::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Category::find()
            .filter(category::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List categories ordered by name, optionally restricted to one kind.
    pub async fn list(&self, kind: Option<CategoryKind>) -> AppResult<Vec<category::Model>> {
        let mut query = Category::find().order_by_asc(category::Column::Name);

        if let Some(kind) = kind {
            query = query.filter(category::Column::Kind.eq(kind));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new category.
    pub async fn create(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a category.
    pub async fn update(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a category. Restaurants and dishes referencing it keep existing with no category.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if let Some(category) = self.find_by_id(id).await? {
            category
                .delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_category(id: &str, name: &str, kind: CategoryKind) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            description: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let category = create_test_category("c1", "Italian", CategoryKind::Restaurant);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[category]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let found = repo.find_by_name("Italian").await.unwrap().unwrap();

        assert_eq!(found.id, "c1");
        assert_eq!(found.kind, CategoryKind::Restaurant);
    }

    #[tokio::test]
    async fn test_list_by_kind() {
        let c1 = create_test_category("c1", "Dessert", CategoryKind::Dish);
        let c2 = create_test_category("c2", "Noodles", CategoryKind::Dish);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.list(Some(CategoryKind::Dish)).await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|c| c.kind == CategoryKind::Dish));
    }

    #[tokio::test]
    async fn test_delete_existing() {
        let category = create_test_category("c1", "Italian", CategoryKind::Restaurant);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[category]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        assert!(repo.delete("c1").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        assert!(matches!(
            repo.get_by_id("nope").await,
            Err(AppError::NotFound(_))
        ));
    }
}
