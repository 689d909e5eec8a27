//! Typed clients for the Mirage Target and Query APIs.
//!
//! [`Vws`] signs Target API requests with a database's server key pair;
//! [`CloudRecoClient`] signs query requests with the client key pair.
//! Every documented failure result code maps to its own [`ClientError`]
//! variant, carrying the raw response.

mod error;
mod query;
mod reports;
mod vws;

pub use error::{ClientError, ErrorResponse};
pub use query::{CloudRecoClient, IncludeTargetData};
pub use reports::{
    DatabaseSummaryReport, QueryResult, QueryTargetData, TargetRecord, TargetStatusAndRecord,
    TargetSummaryReport,
};
pub use vws::{UpdateTarget, Vws};
