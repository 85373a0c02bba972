//! Profile service.

use riviu_common::{AppError, AppResult};
use riviu_db::{
    entities::{profile, user},
    repositories::ProfileRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::services::authz::{Access, Actor, ResourceKind, authorize};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;

/// Input for updating a profile. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 3, max = 30))]
    pub username: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
}

/// Check a username: 3-30 characters of ASCII letters, digits or `_`.
pub fn check_username(username: &str) -> AppResult<()> {
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&username.len()) {
        return Err(AppError::Validation(format!(
            "username: must be {USERNAME_MIN}-{USERNAME_MAX} characters"
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::Validation(
            "username: only letters, numbers and underscores are allowed".to_string(),
        ));
    }
    Ok(())
}

/// Default username derived from the local part of an email address.
///
/// Disallowed characters become `_`, short results are prefixed with `user_`, and long
/// ones are cut to the maximum length.
#[must_use]
pub fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut name: String = local
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if name.len() < USERNAME_MIN {
        name = format!("user_{name}");
    }
    name.truncate(USERNAME_MAX);
    name
}

/// `base` with a suffix taken from the user ID, kept within the maximum length.
fn disambiguate(base: &str, user_id: &str) -> String {
    let suffix: String = user_id
        .chars()
        .rev()
        .take(6)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let keep = USERNAME_MAX - suffix.len() - 1;
    let base: String = base.chars().take(keep).collect();
    format!("{base}_{suffix}")
}

/// Profile service for business logic.
#[derive(Clone)]
pub struct ProfileService {
    profile_repo: ProfileRepository,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(profile_repo: ProfileRepository) -> Self {
        Self { profile_repo }
    }

    /// Get a profile by user ID.
    pub async fn get(&self, user_id: &str) -> AppResult<profile::Model> {
        self.profile_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {user_id}")))
    }

    /// Get a profile by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<profile::Model> {
        self.profile_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile @{username}")))
    }

    /// The user's profile, created with a username derived from the email on first fetch.
    pub async fn get_or_create(&self, user: &user::Model) -> AppResult<profile::Model> {
        if let Some(profile) = self.profile_repo.find_by_id(&user.id).await? {
            return Ok(profile);
        }

        let mut username = username_from_email(&user.email);
        if self.profile_repo.is_username_taken(&username, &user.id).await? {
            username = disambiguate(&username, &user.id);
        }

        let model = profile::ActiveModel {
            id: Set(user.id.clone()),
            username: Set(username),
            bio: Set(None),
            avatar_url: Set(None),
            phone_number: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };
        let profile = self.profile_repo.create(model).await?;
        info!(user_id = %user.id, username = %profile.username, "Profile created");

        Ok(profile)
    }

    /// Update a profile. Only its own user may change it.
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<profile::Model> {
        let profile = self.get(user_id).await?;
        authorize(
            actor,
            ResourceKind::Profile,
            Access::Modify {
                owner_id: &profile.id,
            },
        )?;
        input.validate()?;

        if let Some(username) = &input.username {
            check_username(username)?;
            if username != &profile.username
                && self.profile_repo.is_username_taken(username, user_id).await?
            {
                return Err(AppError::Conflict("Username is already taken".to_string()));
            }
        }

        let mut active: profile::ActiveModel = profile.into();
        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        if let Some(phone_number) = input.phone_number {
            active.phone_number = Set(Some(phone_number));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.profile_repo.update(active).await
    }
}
