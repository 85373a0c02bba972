//! Data access repositories.

mod category;
mod comment;
mod dish;
mod like;
mod profile;
mod rating;
mod restaurant;
mod review;
mod tag;
mod user;

pub use category::CategoryRepository;
pub use comment::CommentRepository;
pub use dish::DishRepository;
pub use like::{LikeRepository, LikeRow, LikeTarget};
pub use profile::ProfileRepository;
pub use rating::RatingRepository;
pub use restaurant::{RestaurantFilter, RestaurantRepository};
pub use review::ReviewRepository;
pub use tag::TagRepository;
pub use user::UserRepository;
