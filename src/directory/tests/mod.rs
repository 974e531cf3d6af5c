//! Unit tests for the directory module.

mod registry_tests;
