pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod router;
pub mod state;

pub mod models {
    pub mod group;
    pub mod role;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod group;
    pub mod memory;
    pub mod role;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod groups;
    pub mod roles;
    pub mod token;
    pub mod users;
}

pub mod handlers {
    pub mod auth;
    pub mod groups;
    pub mod roles;
    pub mod users;
}

pub mod middleware_layer {
    pub mod auth;
}

pub mod validation {
    pub mod json;
    pub mod path;
    pub mod rules;
}

pub use config::Config;
pub use router::router;
pub use state::AppState;
