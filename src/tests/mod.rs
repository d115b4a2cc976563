//! # Application Test Suite
//!
//! Scenario tests that drive the face the way the binary does: through the
//! controller and a renderer, with fixed timestamps instead of the system clock.

mod cli_tests;
