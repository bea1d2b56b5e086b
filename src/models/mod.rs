// Data models (structs)
pub mod auth;
pub mod generation;
pub mod image;
pub mod task;

pub use auth::*;
pub use generation::*;
pub use image::*;
pub use task::*;
