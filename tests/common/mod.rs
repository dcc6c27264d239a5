//! Shared test utilities

use aria_gateway::{DbPool, db};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Create a test session in the database
#[allow(dead_code)]
pub fn create_test_session(db: &DbPool, transport: &str, peer: &str) -> aria_gateway::db::Session {
    let repo = aria_gateway::db::SessionRepo::new(db.clone());
    repo.find_or_create(transport, peer)
        .expect("failed to create test session")
}
