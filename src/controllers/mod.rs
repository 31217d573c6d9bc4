pub mod paste;
pub mod stats;
