// TODO: deny missing docs
#![allow(missing_docs)]

pub mod app;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod output;
pub mod query;
pub mod stats;
pub mod target;
pub mod worker;

pub use error::Error;
pub use hickory_proto::rr::RecordType;
pub use query::{Query, QuerySet};
pub use target::ResolverTarget;

pub type Result<T> = std::result::Result<T, Error>;
