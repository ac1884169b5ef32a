pub mod auth_session;
pub use auth_session::{AuthSession, SessionProfile};

pub mod user_service;
pub use user_service::{ActionResult, CreateUser, UserError, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;
