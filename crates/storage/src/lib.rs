#![forbid(unsafe_code)]

pub mod document;
pub mod repository;
pub mod sqlite;
