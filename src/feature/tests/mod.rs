//! Unit tests for the feature context.

mod gate_tests;
