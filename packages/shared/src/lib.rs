//! Utilities shared by the Kakehashi binaries: logging setup and JST time helpers.

pub mod logger;
pub mod time;
