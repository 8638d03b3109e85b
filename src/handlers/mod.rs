pub mod analysis;
pub mod databases;
pub mod diagnostics;
