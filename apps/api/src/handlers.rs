pub mod admin;
pub mod billing;
pub mod credits;
pub mod entitlements;
pub mod health;
pub mod recordings;
