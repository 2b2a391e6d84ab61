pub mod auth;
pub mod hackathon;
pub mod shared;
pub mod template;
