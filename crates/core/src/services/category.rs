//! Category and tag service. Listing is public; changes are admin-only.

use riviu_common::{AppError, AppResult, IdGenerator};
use riviu_db::{
    entities::{
        category::{self, CategoryKind},
        tag,
    },
    repositories::{CategoryRepository, TagRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::services::authz::{Access, Actor, ResourceKind, authorize};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    pub kind: CategoryKind,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagInput {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// Category service for business logic.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
    tag_repo: TagRepository,
    id_gen: IdGenerator,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository, tag_repo: TagRepository) -> Self {
        Self {
            category_repo,
            tag_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List categories, optionally of one kind.
    pub async fn list(&self, kind: Option<CategoryKind>) -> AppResult<Vec<category::Model>> {
        self.category_repo.list(kind).await
    }

    /// Get a category by ID.
    pub async fn get(&self, id: &str) -> AppResult<category::Model> {
        self.category_repo.get_by_id(id).await
    }

    /// Create a category.
    pub async fn create(
        &self,
        actor: Option<&Actor>,
        input: CreateCategoryInput,
    ) -> AppResult<category::Model> {
        authorize(actor, ResourceKind::Category, Access::Create)?;
        input.validate()?;

        let name = input.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name),
            kind: Set(input.kind),
            description: Set(input.description),
            created_at: Set(chrono::Utc::now().into()),
        };
        let category = self.category_repo.create(model).await?;
        info!(category_id = %category.id, name = %category.name, "Category created");

        Ok(category)
    }

    /// Rename or re-describe a category.
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: &str,
        input: UpdateCategoryInput,
    ) -> AppResult<category::Model> {
        let category = self.category_repo.get_by_id(id).await?;
        authorize(actor, ResourceKind::Category, Access::Modify { owner_id: "" })?;
        input.validate()?;

        let mut active: category::ActiveModel = category.into();
        if let Some(name) = input.name {
            let name = name.trim().to_string();
            self.ensure_name_free(&name, Some(id)).await?;
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }

        self.category_repo.update(active).await
    }

    /// Delete a category. Its restaurants and dishes are kept without a category.
    pub async fn delete(&self, actor: Option<&Actor>, id: &str) -> AppResult<()> {
        self.category_repo.get_by_id(id).await?;
        authorize(actor, ResourceKind::Category, Access::Modify { owner_id: "" })?;

        self.category_repo.delete(id).await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// List every tag.
    pub async fn list_tags(&self) -> AppResult<Vec<tag::Model>> {
        self.tag_repo.list().await
    }

    /// Create a tag.
    pub async fn create_tag(&self, actor: Option<&Actor>, input: CreateTagInput) -> AppResult<tag::Model> {
        authorize(actor, ResourceKind::Tag, Access::Create)?;
        input.validate()?;

        let name = input.name.trim().to_string();
        if self.tag_repo.find_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict(format!("Tag {name} already exists")));
        }

        let model = tag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.tag_repo.create(model).await
    }

    async fn ensure_name_free(&self, name: &str, own_id: Option<&str>) -> AppResult<()> {
        match self.category_repo.find_by_name(name).await? {
            Some(existing) if Some(existing.id.as_str()) != own_id => Err(AppError::Conflict(
                format!("Category {name} already exists"),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use riviu_db::entities::user::Role;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn admin() -> Actor {
        Actor {
            user_id: "root".to_string(),
            role: Role::Admin,
        }
    }

    fn category(id: &str, name: &str) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: name.to_string(),
            kind: CategoryKind::Restaurant,
            description: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> CategoryService {
        let db = Arc::new(db);
        CategoryService::new(CategoryRepository::new(db.clone()), TagRepository::new(db))
    }

    fn input(name: &str) -> CreateCategoryInput {
        CreateCategoryInput {
            name: name.to_string(),
            kind: CategoryKind::Restaurant,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let user = Actor {
            user_id: "alice".to_string(),
            role: Role::User,
        };

        let result = service(db).create(Some(&user), input("Italian")).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[category("c1", "Italian")]])
            .into_connection();

        let result = service(db).create(Some(&admin()), input("Italian")).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_category() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<category::Model>::new()])
            .append_query_results([[category("c1", "Italian")]])
            .into_connection();

        let created = service(db)
            .create(Some(&admin()), input(" Italian "))
            .await
            .unwrap();

        assert_eq!(created.name, "Italian");
    }

    #[tokio::test]
    async fn test_create_tag_duplicate() {
        let existing = tag::Model {
            id: "t1".to_string(),
            name: "vegan".to_string(),
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .into_connection();

        let result = service(db)
            .create_tag(
                Some(&admin()),
                CreateTagInput {
                    name: "vegan".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
