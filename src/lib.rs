pub mod capabilities;
pub mod cli;
pub mod config;
pub mod context;
pub mod decode;
pub mod error;
pub mod inspect;
pub mod invoke;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod report;
pub mod resolver;
pub mod scratch;
pub mod sysfs;
