pub mod accounts;
pub mod auth;
pub mod error;
pub mod media;
pub mod middleware;
pub mod oauth_state;
pub mod plans;
pub mod posts;
pub mod publisher;
pub mod routes;
pub mod social;
pub mod state;
pub mod tasks;

pub use routes::router;
pub use state::{AppState, AppStateInner};
