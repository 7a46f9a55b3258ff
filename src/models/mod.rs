pub mod user;
pub mod recipe;
pub mod tag;
pub mod comment;
pub mod newsletter;

pub use user::User;
pub use recipe::Recipe;
pub use tag::{Tag, TaggableKind};
pub use comment::Comment;
pub use newsletter::Newsletter;
