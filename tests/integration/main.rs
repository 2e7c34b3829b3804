//! Integration tests for the Toolroom server

#[macro_use]
mod common;

mod lifecycle;
mod rollback;
