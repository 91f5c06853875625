pub mod achievement;
pub mod auth;
pub mod cat;
pub mod shared;
