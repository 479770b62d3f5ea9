pub mod config;
pub mod csv;
pub mod email;
pub mod state;
pub mod test_helpers;
