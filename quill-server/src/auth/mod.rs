pub mod extractor;
pub mod handlers;

pub use extractor::CurrentUser;
