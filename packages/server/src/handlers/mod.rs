pub mod auth;
pub mod hackathon;
pub mod template;
