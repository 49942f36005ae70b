pub mod config;
pub mod error;
pub mod extractor;
pub mod scanner;
pub mod resolver;
pub mod help;
pub mod indexer;
pub mod listing;
pub mod viewer;
pub mod xml_builder;
pub mod server;

pub use error::IndexError;
pub use indexer::{build_index, FunctionRecord, Index};
