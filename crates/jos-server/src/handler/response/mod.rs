//! Response types for HTTP handlers.

mod apisix;
mod charts;
mod envelope;
mod errors;
mod monitors;
mod nodes;
mod pods;
mod releases;

pub use apisix::*;
pub use charts::*;
pub use envelope::*;
pub use errors::*;
pub use monitors::*;
pub use nodes::*;
pub use pods::*;
pub use releases::*;
