pub mod identity;
pub mod notification;
pub mod profile;

pub use identity::{normalize_identifier, Identity, IdentityStatus, IdentitySummary, Role};
pub use notification::{Channel, EventKind, NotificationEvent};
pub use profile::{Profile, ProfileSeed};
