//! Crate-level scenario tests with scripted providers.

mod retrieval;
