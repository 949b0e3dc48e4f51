pub mod demo;
pub mod diff;
