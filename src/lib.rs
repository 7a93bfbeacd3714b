pub mod error;
pub mod config;
pub mod credentials;
pub mod claims;
pub mod normalize;
pub mod endpoints;
pub mod dispatch;
pub mod auth;
pub mod resources;
pub mod client;
pub mod logging;

pub use auth::{AuthFlow, LoginOutcome, RoleSource};
pub use client::ApiClient;
pub use config::{ClientConfig, RouteConfig};
pub use credentials::{CredentialStore, Role, Scope};
pub use error::{ApiError, ApiResult};
pub use normalize::Payload;
