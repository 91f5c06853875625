pub mod achievement;
pub mod achievement_cat;
pub mod cat;
pub mod user;
