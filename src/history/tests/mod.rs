//! Unit tests for the history context.
