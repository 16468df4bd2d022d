pub mod import;
pub mod tenant;
pub mod user;

pub use import::*;
pub use tenant::*;
pub use user::*;
