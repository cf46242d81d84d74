pub mod auth;
pub mod groups;
pub mod roles;
pub mod users;
