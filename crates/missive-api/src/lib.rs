pub mod account;
pub mod auth;
pub mod convert;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod rate_limit;
pub mod routes;
pub mod store;
