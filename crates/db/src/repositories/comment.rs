//! Comment repository (comments, their reactions and replies).

use std::sync::Arc;

use crate::entities::{
    Comment, CommentReaction, CommentReply, comment, comment_reaction, comment_reply,
};
use riviu_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait, sea_query::OnConflict,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Comments on a restaurant, oldest first.
    pub async fn find_by_restaurant(&self, restaurant_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment with its reactions and replies.
    pub async fn delete_cascade(&self, id: &str) -> AppResult<()> {
        let db_err = |e: sea_orm::DbErr| AppError::Database(e.to_string());
        let txn = self.db.begin().await.map_err(db_err)?;

        CommentReaction::delete_many()
            .filter(comment_reaction::Column::CommentId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        CommentReply::delete_many()
            .filter(comment_reply::Column::CommentId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        Comment::delete_by_id(id).exec(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)
    }

    // ==================== Reactions ====================

    /// All reactions on a batch of comments.
    pub async fn find_reactions(
        &self,
        comment_ids: &[String],
    ) -> AppResult<Vec<comment_reaction::Model>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        CommentReaction::find()
            .filter(comment_reaction::Column::CommentId.is_in(comment_ids.to_vec()))
            .order_by_asc(comment_reaction::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find one user's reaction with a given emoji on a comment.
    pub async fn find_reaction(
        &self,
        comment_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> AppResult<Option<comment_reaction::Model>> {
        CommentReaction::find()
            .filter(comment_reaction::Column::CommentId.eq(comment_id))
            .filter(comment_reaction::Column::UserId.eq(user_id))
            .filter(comment_reaction::Column::Emoji.eq(emoji))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a reaction unless the user already reacted to the comment with the same
    /// emoji. Returns whether a row was written.
    pub async fn add_reaction(&self, model: comment_reaction::ActiveModel) -> AppResult<bool> {
        let inserted = CommentReaction::insert(model)
            .on_conflict(
                OnConflict::columns([
                    comment_reaction::Column::CommentId,
                    comment_reaction::Column::UserId,
                    comment_reaction::Column::Emoji,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Delete a reaction by ID.
    pub async fn delete_reaction(&self, id: &str) -> AppResult<()> {
        CommentReaction::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ==================== Replies ====================

    /// All replies on a batch of comments, oldest first.
    pub async fn find_replies(
        &self,
        comment_ids: &[String],
    ) -> AppResult<Vec<comment_reply::Model>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        CommentReply::find()
            .filter(comment_reply::Column::CommentId.is_in(comment_ids.to_vec()))
            .order_by_asc(comment_reply::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reply by ID, returning an error if not found.
    pub async fn get_reply(&self, id: &str) -> AppResult<comment_reply::Model> {
        CommentReply::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Reply {id}")))
    }

    /// Create a reply.
    pub async fn create_reply(
        &self,
        model: comment_reply::ActiveModel,
    ) -> AppResult<comment_reply::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a reply by ID.
    pub async fn delete_reply(&self, id: &str) -> AppResult<()> {
        CommentReply::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_comment(id: &str, restaurant_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            user_id: "u1".to_string(),
            content: "Great spot".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_reaction(id: &str, comment_id: &str, emoji: &str) -> comment_reaction::Model {
        comment_reaction::Model {
            id: id.to_string(),
            comment_id: comment_id.to_string(),
            user_id: "u1".to_string(),
            emoji: emoji.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::CommentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_restaurant() {
        let c1 = create_test_comment("c1", "r1");
        let c2 = create_test_comment("c2", "r1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.find_by_restaurant("r1").await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_find_reaction() {
        let reaction = create_test_reaction("x1", "c1", "🔥");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reaction]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let found = repo.find_reaction("c1", "u1", "🔥").await.unwrap();

        assert_eq!(found.unwrap().emoji, "🔥");
    }

    #[tokio::test]
    async fn test_find_reactions_empty_batch() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = CommentRepository::new(db);
        assert!(repo.find_reactions(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_cascade() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results((0..3).map(|_| MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }))
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        assert!(repo.delete_cascade("c1").await.is_ok());
    }
}
