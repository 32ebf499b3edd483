pub mod config;
pub mod generation;
pub mod note;
pub mod patient;
pub mod scenarios;
