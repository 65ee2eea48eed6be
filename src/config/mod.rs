//! Run configuration: the flat option mapping and the tables resolved from it

mod options;
mod resolver;

pub use options::{option, split_list, ImportOptions};
pub use resolver::{
    ConfigError, ExtraDataConfig, MetadataAssignment, SuppressionSet, TermAssignment,
};
