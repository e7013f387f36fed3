//! Integration tests for askbench.

pub mod common;
pub mod executor_test;
pub mod pipeline_test;
