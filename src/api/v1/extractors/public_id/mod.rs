mod core;
mod types;

pub use types::PublicBlogPostId;
