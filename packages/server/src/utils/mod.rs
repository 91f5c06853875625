pub mod achievement;
pub mod color;
pub mod hash;
pub mod image;
pub mod jwt;
