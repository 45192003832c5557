pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod handlers {
    pub mod admin;
    pub mod fallback;
    pub mod health;
    pub mod login;
}

pub mod models {
    pub mod admin;
    pub mod login;
    pub mod permission;
    pub mod user;
}

pub mod security {
    pub mod rate_limiter;
}

pub mod stores;
pub mod users;

pub mod utils {
    pub mod auth;
    pub mod client_ip;
    pub mod sql;
    pub mod time;
}
