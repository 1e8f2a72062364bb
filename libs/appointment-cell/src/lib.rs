pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod wall_clock;

pub use models::*;
