//! Command-level tests

mod test_export;
