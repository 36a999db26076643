//! Test utilities for ResolveLite integration tests
//!
//! `TestFixture` opens an isolated engine (temporary project directory or a
//! memory datastore) through the public `open_backend` API only.

pub mod test_fixture;
