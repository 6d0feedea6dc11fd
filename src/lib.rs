// Core infrastructure modules
pub mod core;

// Feature-specific modules
pub mod config;
pub mod form;
pub mod repl;
pub mod results_grid;
pub mod session;
