//! Route paths.

pub const POST_LOGIN: &str = "/login";
pub const POST_REFRESH: &str = "/refresh";
pub const POST_LOGOUT: &str = "/logout";

pub const USERS: &str = "/users";
pub const USERS_ME: &str = "/users/me";

pub const POSTS: &str = "/posts";
pub const POSTS_ID: &str = "/posts/{post_id}";
pub const POSTS_ID_COMMENTS: &str = "/posts/{post_id}/comments";
pub const POSTS_ID_LIKES: &str = "/posts/{post_id}/likes";

pub const COMMENTS_ID: &str = "/comments/{comment_id}";
pub const LIKES_ID: &str = "/likes/{like_id}";
