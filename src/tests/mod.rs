// Test modules

pub mod common;
mod models_test;
