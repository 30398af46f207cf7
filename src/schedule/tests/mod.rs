//! Unit tests for the schedule context.

mod trigger_tests;
