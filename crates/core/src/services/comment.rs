//! Comment service: restaurant comments, emoji reactions and replies.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, FixedOffset};
use riviu_common::{AppError, AppResult, IdGenerator};
use riviu_db::{
    entities::{comment, comment_reaction, comment_reply, profile},
    repositories::{CommentRepository, ProfileRepository, RestaurantRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use crate::services::authz::{Access, Actor, ResourceKind, authorize};

/// Emoji accepted as comment reactions.
pub const ALLOWED_REACTIONS: [&str; 6] = ["👍", "❤️", "😋", "🔥", "👏", "😍"];

/// Display name used when the author has no profile.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous User";

/// Author of a comment or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl CommentAuthor {
    fn resolve(user_id: &str, profiles: &HashMap<String, profile::Model>) -> Self {
        match profiles.get(user_id) {
            Some(profile) => Self {
                id: user_id.to_string(),
                username: profile.username.clone(),
                avatar_url: profile.avatar_url.clone(),
            },
            None => Self {
                id: user_id.to_string(),
                username: ANONYMOUS_AUTHOR.to_string(),
                avatar_url: None,
            },
        }
    }
}

/// Reactions on a comment with one emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionGroup {
    pub emoji: String,
    pub count: u64,
    pub user_ids: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: String,
    pub comment_id: String,
    pub author: CommentAuthor,
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
}

/// A comment with its grouped reactions and chronological replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: String,
    pub restaurant_id: String,
    pub author: CommentAuthor,
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
    pub reactions: Vec<ReactionGroup>,
    pub replies: Vec<ReplyView>,
}

/// Input for a comment or a reply.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

impl CommentInput {
    fn content(&self) -> AppResult<String> {
        self.validate()?;
        let content = self.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("content: must not be blank".to_string()));
        }
        Ok(content.to_string())
    }
}

/// Input for a reaction toggle.
#[derive(Debug, Deserialize)]
pub struct ReactionInput {
    pub emoji: String,
}

/// Group reactions by emoji, in order of first appearance.
#[must_use]
pub fn group_reactions(reactions: &[comment_reaction::Model]) -> Vec<ReactionGroup> {
    let mut groups: Vec<ReactionGroup> = Vec::new();
    for reaction in reactions {
        let group = match groups.iter().position(|g| g.emoji == reaction.emoji) {
            Some(index) => &mut groups[index],
            None => {
                groups.push(ReactionGroup {
                    emoji: reaction.emoji.clone(),
                    count: 0,
                    user_ids: BTreeSet::new(),
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };
        if group.user_ids.insert(reaction.user_id.clone()) {
            group.count += 1;
        }
    }
    groups
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    restaurant_repo: RestaurantRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        restaurant_repo: RestaurantRepository,
        profile_repo: ProfileRepository,
    ) -> Self {
        Self {
            comment_repo,
            restaurant_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment threads of a restaurant, oldest first.
    pub async fn list(&self, restaurant_id: &str) -> AppResult<Vec<CommentThread>> {
        let comments = self.comment_repo.find_by_restaurant(restaurant_id).await?;
        if comments.is_empty() {
            return Ok(vec![]);
        }

        let comment_ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();
        let reactions = self.comment_repo.find_reactions(&comment_ids).await?;
        let replies = self.comment_repo.find_replies(&comment_ids).await?;

        let author_ids: Vec<String> = comments
            .iter()
            .map(|c| c.user_id.clone())
            .chain(replies.iter().map(|r| r.user_id.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let profiles = self.profiles(&author_ids).await?;

        let mut reactions_by_comment: HashMap<&str, Vec<comment_reaction::Model>> = HashMap::new();
        for reaction in &reactions {
            reactions_by_comment
                .entry(reaction.comment_id.as_str())
                .or_default()
                .push(reaction.clone());
        }
        let mut replies_by_comment: HashMap<String, Vec<ReplyView>> = HashMap::new();
        for reply in replies {
            replies_by_comment
                .entry(reply.comment_id.clone())
                .or_default()
                .push(reply_view(reply, &profiles));
        }

        Ok(comments
            .into_iter()
            .map(|c| {
                let reactions = reactions_by_comment
                    .get(c.id.as_str())
                    .map(|r| group_reactions(r))
                    .unwrap_or_default();
                let replies = replies_by_comment.remove(&c.id).unwrap_or_default();
                thread(c, &profiles, reactions, replies)
            })
            .collect())
    }

    /// Post a comment on a restaurant.
    pub async fn create(
        &self,
        actor: Option<&Actor>,
        restaurant_id: &str,
        input: CommentInput,
    ) -> AppResult<CommentThread> {
        let actor = authorize(actor, ResourceKind::Comment, Access::Create)?;
        let content = input.content()?;
        self.restaurant_repo.get_by_id(restaurant_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            restaurant_id: Set(restaurant_id.to_string()),
            user_id: Set(actor.user_id.clone()),
            content: Set(content),
            created_at: Set(chrono::Utc::now().into()),
        };
        let comment = self.comment_repo.create(model).await?;
        debug!(comment_id = %comment.id, restaurant_id = %restaurant_id, "Comment created");

        let profiles = self.profiles(std::slice::from_ref(&actor.user_id)).await?;
        Ok(thread(comment, &profiles, vec![], vec![]))
    }

    /// Delete a comment with its reactions and replies. Author only.
    pub async fn delete(&self, actor: Option<&Actor>, comment_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        authorize(
            actor,
            ResourceKind::Comment,
            Access::Modify {
                owner_id: &comment.user_id,
            },
        )?;

        self.comment_repo.delete_cascade(comment_id).await?;
        info!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }

    /// Add the actor's reaction with `emoji`, or remove it if already present.
    ///
    /// Returns the comment's reaction groups after the toggle.
    pub async fn toggle_reaction(
        &self,
        actor: Option<&Actor>,
        comment_id: &str,
        input: ReactionInput,
    ) -> AppResult<Vec<ReactionGroup>> {
        let actor = authorize(actor, ResourceKind::Comment, Access::Create)?;
        if !ALLOWED_REACTIONS.contains(&input.emoji.as_str()) {
            return Err(AppError::Validation(format!(
                "emoji: {} is not an allowed reaction",
                input.emoji
            )));
        }
        self.comment_repo.get_by_id(comment_id).await?;

        match self
            .comment_repo
            .find_reaction(comment_id, &actor.user_id, &input.emoji)
            .await?
        {
            Some(existing) => self.comment_repo.delete_reaction(&existing.id).await?,
            None => {
                let model = comment_reaction::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    comment_id: Set(comment_id.to_string()),
                    user_id: Set(actor.user_id.clone()),
                    emoji: Set(input.emoji),
                    created_at: Set(chrono::Utc::now().into()),
                };
                if !self.comment_repo.add_reaction(model).await? {
                    debug!(comment_id = %comment_id, user_id = %actor.user_id, "Reaction already present");
                }
            }
        }

        let reactions = self
            .comment_repo
            .find_reactions(&[comment_id.to_string()])
            .await?;
        Ok(group_reactions(&reactions))
    }

    /// Reply to a comment.
    pub async fn reply(
        &self,
        actor: Option<&Actor>,
        comment_id: &str,
        input: CommentInput,
    ) -> AppResult<ReplyView> {
        let actor = authorize(actor, ResourceKind::Reply, Access::Create)?;
        let content = input.content()?;
        self.comment_repo.get_by_id(comment_id).await?;

        let model = comment_reply::ActiveModel {
            id: Set(self.id_gen.generate()),
            comment_id: Set(comment_id.to_string()),
            user_id: Set(actor.user_id.clone()),
            content: Set(content),
            created_at: Set(chrono::Utc::now().into()),
        };
        let reply = self.comment_repo.create_reply(model).await?;

        let profiles = self.profiles(std::slice::from_ref(&actor.user_id)).await?;
        Ok(reply_view(reply, &profiles))
    }

    /// Delete a reply. Author only.
    pub async fn delete_reply(&self, actor: Option<&Actor>, reply_id: &str) -> AppResult<()> {
        let reply = self.comment_repo.get_reply(reply_id).await?;
        authorize(
            actor,
            ResourceKind::Reply,
            Access::Modify {
                owner_id: &reply.user_id,
            },
        )?;

        self.comment_repo.delete_reply(reply_id).await
    }

    async fn profiles(&self, user_ids: &[String]) -> AppResult<HashMap<String, profile::Model>> {
        Ok(self
            .profile_repo
            .find_by_ids(user_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect())
    }
}

fn thread(
    comment: comment::Model,
    profiles: &HashMap<String, profile::Model>,
    reactions: Vec<ReactionGroup>,
    replies: Vec<ReplyView>,
) -> CommentThread {
    CommentThread {
        author: CommentAuthor::resolve(&comment.user_id, profiles),
        id: comment.id,
        restaurant_id: comment.restaurant_id,
        content: comment.content,
        created_at: comment.created_at,
        reactions,
        replies,
    }
}

fn reply_view(reply: comment_reply::Model, profiles: &HashMap<String, profile::Model>) -> ReplyView {
    ReplyView {
        author: CommentAuthor::resolve(&reply.user_id, profiles),
        id: reply.id,
        comment_id: reply.comment_id,
        content: reply.content,
        created_at: reply.created_at,
    }
}
