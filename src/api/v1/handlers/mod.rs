pub mod blogposts;
pub mod health;
pub mod roles;
