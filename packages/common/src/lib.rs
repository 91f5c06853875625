//! Framework-free building blocks shared by the Kittygram packages.

pub mod storage;
