//! Common test utilities for filing-dl integration tests

#[allow(dead_code)]
pub mod registry;
#[allow(dead_code)]
pub mod renderer;

#[allow(unused_imports)]
pub use registry::*;
#[allow(unused_imports)]
pub use renderer::*;
