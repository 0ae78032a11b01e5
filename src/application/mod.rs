pub mod analytics;
pub mod comments;
pub mod error;
pub mod listing;
pub mod posts;
pub mod profiles;
pub mod repos;
pub mod session;
pub mod views;
