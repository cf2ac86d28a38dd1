//! Integration tests against a throwaway PostgreSQL database.
//!
//! Each test gets a fresh database from `#[sqlx::test]`; run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

mod common;
mod dashboard;
mod locking;
mod requests;
mod rules;
