//! Process-level setup for the binary and for library callers that want the
//! system resolver: logging and the hickory DNS resolver.

mod logger;
mod resolver;

pub use logger::init_logger_with;
pub use resolver::init_resolver;
