//! Business logic services.

#![allow(missing_docs)]

pub mod aggregation;
pub mod authz;
pub mod category;
pub mod comment;
pub mod dish;
pub mod feed;
pub mod like;
pub mod media;
pub mod mood;
pub mod profile;
pub mod rating;
pub mod restaurant;
pub mod review;
pub mod search;
pub mod session;
pub mod user;

pub use aggregation::{AggregationService, LikeSummary, RatingSummary, join_like_summaries};
pub use authz::{Access, Actor, ResourceKind, authorize};
pub use category::{CategoryService, CreateCategoryInput, CreateTagInput, UpdateCategoryInput};
pub use comment::{
    ALLOWED_REACTIONS, CommentAuthor, CommentInput, CommentService, CommentThread, ReactionGroup,
    ReactionInput, ReplyView, group_reactions,
};
pub use dish::{CreateDishInput, DishService, UpdateDishInput};
pub use feed::{FeedEntry, FeedQuery, FeedService, FeedView, RestaurantCard, sort_feed};
pub use like::LikeService;
pub use media::{ImageFormat, MediaService, UploadedImage};
pub use mood::{Mood, MoodView, classify_mood, classify_mood_at_hour, classify_mood_in};
pub use profile::{ProfileService, UpdateProfileInput, check_username, username_from_email};
pub use rating::{RateInput, RatingService, RatingView};
pub use restaurant::{
    CreatePostInput, CreateRestaurantInput, CreatedPost, RestaurantListQuery, RestaurantService,
    RestaurantView, UpdateRestaurantInput,
};
pub use review::{CreateReviewInput, ReviewService, ReviewTarget, ReviewView};
pub use search::{SearchDebouncer, SearchOutcome, Searchable, filter_items, matches_query};
pub use session::{Session, SessionContext, SessionEvent, Subscription};
pub use user::{AuthSession, ChangePasswordInput, SignInInput, SignUpInput, UserService};
