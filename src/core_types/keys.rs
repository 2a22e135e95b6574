//! Standard keys shared by error projections, response bodies and log entries.
//!
//! Keeping them stable allows searching across services (e.g. log insights).

/// Entry holding an [`InfoClassification`](super::InfoClassification) name.
pub const CLASSIFICATION: &str = "classification";

/// Free form message.
pub const MESSAGE: &str = "msg";

/// Arguments, e.g. when logging function arguments.
pub const ARGUMENTS: &str = "args";

/// Return value, e.g. when logging a function return value.
pub const RETURN: &str = "return";

/// Semantic operation such as `pay-invoice` or `create-offer`, independent of function name.
pub const OPERATION: &str = "operation";

/// Reserved body key holding one error object or a list of them.
pub const ERROR: &str = "error";
