//! End-to-end tests: kernels compiled to modules, then decoded or executed.

pub(crate) mod helper;

mod control_flow_tests;
mod module_tests;
