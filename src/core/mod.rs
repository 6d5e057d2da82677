mod args;
mod error;
mod logger;
mod tag;

pub use args::CliArgs;
pub use error::{BackendError, ErrorKind, NormalizationError, ReelError, ValidationError};
pub use logger::setup_logging;
pub use tag::BackendTag;
