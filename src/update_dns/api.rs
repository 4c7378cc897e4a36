use thiserror::Error;

use crate::http::RequestFailure;

/// Why a single record could not be resolved or updated.
///
/// None of these stop a run; the updater logs them and moves on.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record not found")]
    NotFound,
    #[error("provider rejected the change: {0}")]
    Rejected(String),
    #[error(transparent)]
    Request(#[from] RequestFailure),
    #[error("unreadable provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A DNS host whose `A` records can be repointed.
pub trait UpdateDns {
    fn describe(&self) -> String;

    /// Looks up the provider's id for the `A` record named exactly `name`.
    fn resolve_record_id(&self, zone_id: &str, name: &str) -> Result<String, RecordError>;

    fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        name: &str,
        new_ip: &str,
    ) -> Result<(), RecordError>;
}
