//! Test utilities for ResolveLite SDK integration tests

pub mod test_fixture;
