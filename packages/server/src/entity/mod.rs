pub mod hackathon;
pub mod register;
pub mod template;
pub mod user;
pub mod user_email;
