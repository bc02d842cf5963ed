pub mod registration;
pub mod session;

pub use registration::register;
pub use session::{login, logout, me};
