//! Protocol Service - every user action as one request/response
//!
//! The presentation layer turns input into an [`Action`], calls
//! [`ProtocolService::dispatch`], and renders the returned [`Response`].
//! Handlers never print. User mistakes (bad id, wrong password) come back as
//! responses; only storage, template and I/O failures are errors.

use std::path::PathBuf;

use protocolo_domain::model::{NewProtocol, ProtocolRecord};
use protocolo_domain::repository::ProtocolRepository;
use protocolo_domain::service::{AccessDenied, PurgeAuthorizer};
use protocolo_types::Result;

use crate::export::{export_table, fill_template, ExportedFile};

/// A user action with its input already collected
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Submit the registration form
    Register(NewProtocol),

    /// Look up one protocol; `raw_id` is the text typed by the user
    Lookup { raw_id: String, export: bool },

    /// Show every protocol
    ListAll { export: bool },

    /// Purge every protocol behind the delete password
    DeleteAll { secret: String },
}

/// Outcome of an action, ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Registered { id: i32 },
    Found {
        record: ProtocolRecord,
        export: Option<ExportedFile>,
    },
    /// No protocol has this id; ids past the store's range land here too
    NotFound { id: i64 },
    /// Lookup input was blank
    MissingId,
    /// Lookup input was not an integer
    InvalidId { input: String },
    Listed {
        records: Vec<ProtocolRecord>,
        export: Option<ExportedFile>,
    },
    Deleted { count: u64 },
    DeleteDenied(AccessDenied),
}

/// Where exports are read from and written to
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub template_path: PathBuf,
    pub export_dir: PathBuf,
}

enum IdInput {
    Blank,
    Invalid,
    /// An integer no stored id can take
    OutOfRange(i64),
    Valid(i32),
}

fn parse_id(raw: &str) -> IdInput {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return IdInput::Blank;
    }
    match trimmed.parse::<i64>() {
        Ok(id) => match i32::try_from(id) {
            Ok(id) => IdInput::Valid(id),
            Err(_) => IdInput::OutOfRange(id),
        },
        Err(_) => IdInput::Invalid,
    }
}

pub struct ProtocolService {
    repo: Box<dyn ProtocolRepository>,
    gate: Box<dyn PurgeAuthorizer>,
    exports: ExportSettings,
}

impl ProtocolService {
    pub fn new(
        repo: Box<dyn ProtocolRepository>,
        gate: Box<dyn PurgeAuthorizer>,
        exports: ExportSettings,
    ) -> Self {
        Self {
            repo,
            gate,
            exports,
        }
    }

    pub async fn dispatch(&self, action: Action) -> Result<Response> {
        match action {
            Action::Register(protocol) => self.register(&protocol).await,
            Action::Lookup { raw_id, export } => self.lookup(&raw_id, export).await,
            Action::ListAll { export } => self.list_all(export).await,
            Action::DeleteAll { secret } => self.delete_all(&secret).await,
        }
    }

    pub async fn register(&self, protocol: &NewProtocol) -> Result<Response> {
        let id = self.repo.insert(protocol).await?;
        Ok(Response::Registered { id })
    }

    /// Parses the id before touching the store; bad input never reaches it
    pub async fn lookup(&self, raw_id: &str, export: bool) -> Result<Response> {
        let id = match parse_id(raw_id) {
            IdInput::Blank => return Ok(Response::MissingId),
            IdInput::Invalid => {
                return Ok(Response::InvalidId {
                    input: raw_id.to_string(),
                })
            }
            IdInput::OutOfRange(id) => return Ok(Response::NotFound { id }),
            IdInput::Valid(id) => id,
        };

        let Some(record) = self.repo.find_by_id(id).await? else {
            return Ok(Response::NotFound { id: id.into() });
        };

        let export = if export {
            Some(fill_template(
                std::slice::from_ref(&record),
                &self.exports.template_path,
                &self.exports.export_dir,
            )?)
        } else {
            None
        };

        Ok(Response::Found { record, export })
    }

    /// The table export is only produced when there is something to export
    pub async fn list_all(&self, export: bool) -> Result<Response> {
        let records = self.repo.list_all().await?;
        let export = if export && !records.is_empty() {
            Some(export_table(&records, &self.exports.export_dir)?)
        } else {
            None
        };
        Ok(Response::Listed { records, export })
    }

    pub async fn delete_all(&self, secret: &str) -> Result<Response> {
        match self.gate.authorize(secret) {
            Ok(grant) => {
                let count = self.repo.delete_all(&grant).await?;
                Ok(Response::Deleted { count })
            }
            Err(denied) => {
                log::warn!("Bulk deletion refused: {}", denied);
                Ok(Response::DeleteDenied(denied))
            }
        }
    }

    /// Release the store
    pub async fn shutdown(self) {
        self.repo.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert!(matches!(parse_id("42"), IdInput::Valid(42)));
        assert!(matches!(parse_id(" 7 "), IdInput::Valid(7)));
        assert!(matches!(parse_id("+3"), IdInput::Valid(3)));
        assert!(matches!(parse_id(""), IdInput::Blank));
        assert!(matches!(parse_id("   "), IdInput::Blank));
        assert!(matches!(parse_id("abc"), IdInput::Invalid));
        assert!(matches!(parse_id("4.5"), IdInput::Invalid));
        assert!(matches!(parse_id("99999999999"), IdInput::OutOfRange(99_999_999_999)));
        assert!(matches!(parse_id("-2147483649"), IdInput::OutOfRange(_)));
        assert!(matches!(parse_id("2147483647"), IdInput::Valid(i32::MAX)));
        assert!(matches!(parse_id("99999999999999999999"), IdInput::Invalid));
    }
}
