//! Unit tests for the cycle context.

mod run_tests;
