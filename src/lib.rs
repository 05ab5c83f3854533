pub mod config;
pub mod error;
pub mod normalize;
pub mod output;
pub mod parsers;
pub mod pipeline;
pub mod schema;
pub mod sheet;
