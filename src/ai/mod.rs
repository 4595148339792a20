pub mod client;
pub mod json_parser;
pub mod naming;
pub mod prompts;

pub use client::*;
pub use naming::*;
