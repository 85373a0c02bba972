//! Authorization.
//!
//! Every mutating entry point calls [`authorize`] before touching the store.

use riviu_common::{AppError, AppResult};
use riviu_db::entities::user::{self, Role};

/// The user performing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&user::Model> for Actor {
    fn from(user: &user::Model) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
        }
    }
}

/// Kinds of resources guarded by [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Restaurant,
    Dish,
    Review,
    Comment,
    Reply,
    Category,
    Tag,
    Rating,
    Like,
    Profile,
}

impl ResourceKind {
    const fn noun(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Dish => "dish",
            Self::Review => "review",
            Self::Comment => "comment",
            Self::Reply => "reply",
            Self::Category => "category",
            Self::Tag => "tag",
            Self::Rating => "rating",
            Self::Like => "like",
            Self::Profile => "profile",
        }
    }
}

/// What the actor wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// Create a new resource.
    Create,
    /// Update or delete a resource owned by `owner_id`.
    Modify { owner_id: &'a str },
}

/// Check that `actor` may perform `access` on a resource of `kind`.
///
/// - No actor: `Unauthorized`.
/// - Categories and tags: admins only.
/// - Create: any signed-in user.
/// - Restaurants, dishes and reviews: the owner or an admin.
/// - Comments, replies, ratings, likes and profiles: the author only.
pub fn authorize<'a>(
    actor: Option<&'a Actor>,
    kind: ResourceKind,
    access: Access<'_>,
) -> AppResult<&'a Actor> {
    let actor = actor.ok_or(AppError::Unauthorized)?;

    let allowed = match (kind, access) {
        (ResourceKind::Category | ResourceKind::Tag, _) => actor.is_admin(),
        (_, Access::Create) => true,
        (ResourceKind::Restaurant | ResourceKind::Dish | ResourceKind::Review, Access::Modify { owner_id }) => {
            owner_id == actor.user_id || actor.is_admin()
        }
        (
            ResourceKind::Comment
            | ResourceKind::Reply
            | ResourceKind::Rating
            | ResourceKind::Like
            | ResourceKind::Profile,
            Access::Modify { owner_id },
        ) => owner_id == actor.user_id,
    };

    if allowed {
        Ok(actor)
    } else {
        Err(AppError::Forbidden(format!(
            "Not allowed to modify this {}",
            kind.noun()
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(id: &str) -> Actor {
        Actor {
            user_id: id.to_string(),
            role: Role::User,
        }
    }

    fn admin(id: &str) -> Actor {
        Actor {
            user_id: id.to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_anonymous_is_unauthorized() {
        let result = authorize(None, ResourceKind::Review, Access::Create);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_any_user_can_create_content() {
        let alice = user("alice");
        for kind in [ResourceKind::Restaurant, ResourceKind::Review, ResourceKind::Comment] {
            assert!(authorize(Some(&alice), kind, Access::Create).is_ok());
        }
    }

    #[test]
    fn test_owner_or_admin_modifies_restaurant() {
        let owner = Access::Modify { owner_id: "alice" };
        let alice = user("alice");
        let root = admin("root");
        let bob = user("bob");
        assert!(authorize(Some(&alice), ResourceKind::Restaurant, owner).is_ok());
        assert!(authorize(Some(&root), ResourceKind::Restaurant, owner).is_ok());

        let result = authorize(Some(&bob), ResourceKind::Review, owner);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_comments_are_author_only() {
        let owner = Access::Modify { owner_id: "alice" };
        let alice = user("alice");
        let root = admin("root");
        assert!(authorize(Some(&alice), ResourceKind::Comment, owner).is_ok());

        let result = authorize(Some(&root), ResourceKind::Reply, owner);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_personal_records_belong_to_their_user() {
        let owner = Access::Modify { owner_id: "alice" };
        let alice = user("alice");
        let root = admin("root");
        for kind in [ResourceKind::Rating, ResourceKind::Like, ResourceKind::Profile] {
            assert!(authorize(Some(&alice), kind, owner).is_ok());
            let result = authorize(Some(&root), kind, owner);
            assert!(matches!(result, Err(AppError::Forbidden(_))));
        }
        let result = authorize(None, ResourceKind::Like, Access::Create);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_vocabularies_are_admin_only() {
        let alice = user("alice");
        let root = admin("root");
        let result = authorize(Some(&alice), ResourceKind::Category, Access::Create);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(authorize(Some(&root), ResourceKind::Tag, Access::Create).is_ok());
    }
}
