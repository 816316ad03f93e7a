pub mod post;
pub mod user;

pub use post::{Post, PostInput, PostQuery, PostResponse};
pub use user::{
    CreateUserRequest, LoginForm, NewUser, TokenResponse, User, UserResponse, ValidationError,
    normalize_email,
};
