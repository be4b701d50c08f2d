pub mod common;
pub mod leave;
pub mod user;
