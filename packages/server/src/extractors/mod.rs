pub mod auth;
pub mod cat_payload;
pub mod json;
