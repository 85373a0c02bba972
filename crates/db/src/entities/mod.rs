//! Database entities.

pub mod category;
pub mod comment;
pub mod comment_reaction;
pub mod comment_reply;
pub mod dish;
pub mod post_like;
pub mod profile;
pub mod rating;
pub mod restaurant;
pub mod restaurant_tag;
pub mod review;
pub mod review_like;
pub mod tag;
pub mod user;

pub use category::Entity as Category;
pub use comment::Entity as Comment;
pub use comment_reaction::Entity as CommentReaction;
pub use comment_reply::Entity as CommentReply;
pub use dish::Entity as Dish;
pub use post_like::Entity as PostLike;
pub use profile::Entity as Profile;
pub use rating::Entity as Rating;
pub use restaurant::Entity as Restaurant;
pub use restaurant_tag::Entity as RestaurantTag;
pub use review::Entity as Review;
pub use review_like::Entity as ReviewLike;
pub use tag::Entity as Tag;
pub use user::Entity as User;
