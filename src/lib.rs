pub mod aggregate;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod registry;
pub mod stats;
pub mod trainer;
