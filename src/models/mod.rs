//! Data models for the top-up storefront.
//!
//! These models match the storefront frontend interfaces exactly for seamless
//! interoperability; everything serializes as camelCase JSON.

mod notification;
mod order;
mod settings;
mod user;

pub use notification::*;
pub use order::*;
pub use settings::*;
pub use user::*;
