//! HTTP handlers for identity-service.

pub mod auth;
pub mod broadcast;
pub mod identity;
pub mod metrics;
