//! Services layer for identity-service.
//!
//! The access gate owns credentials and sessions, the approval service owns
//! status transitions, and the dispatcher fans their events out to live
//! subscribers. Persistence sits behind `IdentityStore` and
//! `ProfileDirectory` so the workflow runs the same against PostgreSQL or
//! in memory.

pub mod access_gate;
pub mod approval;
mod database;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod policy;
pub mod revocation;
pub mod session;
pub mod store;

pub use access_gate::{AccessGate, AuthenticatedSession, Registration, SessionContext};
pub use approval::{ApprovalService, Transition};
pub use database::Database;
pub use directory::{InMemoryProfileDirectory, ProfileDirectory};
pub use dispatcher::{NotificationDispatcher, Subscription};
pub use error::ServiceError;
pub use policy::Principal;
pub use revocation::{InMemoryRevocationList, RedisRevocationList, SessionRevocationList};
pub use session::{IssuedSession, SessionClaims, SessionService};
pub use store::{IdentityStore, InMemoryIdentityStore};
