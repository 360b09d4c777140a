pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod session;
pub mod user;

pub use comment::{Comment, CommentRepo, NewComment};
pub use follow::{Follow, FollowRepo};
pub use group::{Group, GroupRepo, NewGroup};
pub use post::{NewPost, Post, PostChanges, PostFilter, PostRepo};
pub use session::SessionRepo;
pub use user::{NewUser, User, UserRepo};

/// Row id type shared by every table.
pub type DbId = i64;
