//! Export service with pluggable collaborators
//!
//! Wraps an [`Exporter`] with the pieces a hosted deployment needs around it:
//! resolving who asked, recording that an export happened and mailing the
//! result. Each collaborator is a trait so the core stays free of any
//! particular identity, storage or mail backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::ExportFormat;
use crate::document::{Document, ValidationReport, sanitize_document, validate_document};
use crate::error::ExportError;
use crate::export::{ExportedDocument, Exporter};

/// The caller behind an opaque access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Metadata about one completed export. The binary itself is never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub user_id: String,
    pub title: String,
    pub format: ExportFormat,
    pub filename: String,
    pub byte_len: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub filename: String,
    pub media_type: &'static str,
    pub attachment: Vec<u8>,
}

pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Option<UserIdentity>;
}

pub trait RecordStore: Send + Sync {
    fn record(&self, record: ExportRecord) -> anyhow::Result<()>;
}

pub trait EmailDispatcher: Send + Sync + 'static {
    fn dispatch(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Access token was not recognized")]
    Unauthorized,

    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Clone)]
pub struct ExportService {
    exporter: Exporter,
    identity: Arc<dyn IdentityProvider>,
    records: Arc<dyn RecordStore>,
    email: Option<Arc<dyn EmailDispatcher>>,
    sanitize: bool,
    timeout: Option<Duration>,
}

impl ExportService {
    pub fn new(exporter: Exporter, identity: Arc<dyn IdentityProvider>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            exporter,
            identity,
            records,
            email: None,
            sanitize: true,
            timeout: None,
        }
    }

    pub fn with_email(mut self, dispatcher: Arc<dyn EmailDispatcher>) -> Self {
        self.email = Some(dispatcher);
        self
    }

    /// Stop waiting for an async export after `timeout`. The export itself
    /// keeps running on the blocking pool and its result is dropped.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Export papers exactly as given, without repairing tables first.
    pub fn without_sanitize(mut self) -> Self {
        self.sanitize = false;
        self
    }

    pub fn validate(&self, document: &Document) -> ValidationReport {
        validate_document(document)
    }

    fn authorize(&self, token: &str) -> Result<UserIdentity, ServiceError> {
        self.identity.resolve(token).ok_or(ServiceError::Unauthorized)
    }

    pub fn export(&self, token: &str, document: &Document, format: ExportFormat) -> Result<ExportedDocument, ServiceError> {
        let user = self.authorize(token)?;
        let exported = if self.sanitize {
            self.exporter.export(&sanitize_document(document), format)?
        } else {
            self.exporter.export(document, format)?
        };
        self.record(&user, &document.title, &exported);
        Ok(exported)
    }

    /// Export on the blocking pool, honoring the configured timeout.
    ///
    /// When an email dispatcher is configured and a recipient is known
    /// (`notify`, or else the caller's own address) the result is mailed in
    /// the background. Mail failures are logged and never reach the caller.
    pub async fn export_async(
        &self,
        token: &str,
        document: Document,
        format: ExportFormat,
        notify: Option<String>,
    ) -> Result<ExportedDocument, ServiceError> {
        let user = self.authorize(token)?;
        let title = document.title.clone();

        let exporter = self.exporter.clone();
        let sanitize = self.sanitize;
        let task = tokio::task::spawn_blocking(move || {
            if sanitize {
                exporter.export(&sanitize_document(&document), format)
            } else {
                exporter.export(&document, format)
            }
        });

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| ExportError::TimedOut(limit))?,
            None => task.await,
        };
        let exported = joined.map_err(|err| ExportError::Task(err.to_string()))??;

        self.record(&user, &title, &exported);

        if let (Some(dispatcher), Some(to)) = (&self.email, notify.or_else(|| user.email.clone())) {
            let message = EmailMessage {
                to,
                subject: format!("Your paper: {title}"),
                body: format!("Attached is {} ({} bytes).", exported.filename, exported.len()),
                filename: exported.filename.clone(),
                media_type: exported.media_type(),
                attachment: exported.bytes.clone(),
            };
            let dispatcher = Arc::clone(dispatcher);
            tokio::spawn(async move {
                let to = message.to.clone();
                match tokio::task::spawn_blocking(move || dispatcher.dispatch(&message)).await {
                    Ok(Ok(())) => tracing::info!(%to, "sent export email"),
                    Ok(Err(err)) => tracing::warn!(%to, error = %err, "failed to send export email"),
                    Err(err) => tracing::warn!(%to, error = %err, "email task failed"),
                }
            });
        }

        Ok(exported)
    }

    fn record(&self, user: &UserIdentity, title: &str, exported: &ExportedDocument) {
        let record = ExportRecord {
            user_id: user.user_id.clone(),
            title: title.to_string(),
            format: exported.format,
            filename: exported.filename.clone(),
            byte_len: exported.len(),
            created_at: Utc::now(),
        };
        if let Err(err) = self.records.record(record) {
            tracing::warn!(user = %user.user_id, error = %err, "failed to record export");
        }
    }
}

/// Tokens mapped to fixed identities.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, UserIdentity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: impl Into<String>, identity: UserIdentity) -> Self {
        self.users.insert(token.into(), identity);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve(&self, token: &str) -> Option<UserIdentity> {
        self.users.get(token).cloned()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Vec<ExportRecord>>,
}

impl InMemoryRecordStore {
    pub fn records(&self) -> Vec<ExportRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn record(&self, record: ExportRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("record store lock poisoned"))?
            .push(record);
        Ok(())
    }
}

/// Collects messages instead of sending them. `failing()` makes every
/// dispatch return an error.
#[derive(Debug, Default)]
pub struct InMemoryEmailDispatcher {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl InMemoryEmailDispatcher {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl EmailDispatcher for InMemoryEmailDispatcher {
    fn dispatch(&self, message: &EmailMessage) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("mail relay refused {}", message.to);
        }
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mailbox lock poisoned"))?
            .push(message.clone());
        Ok(())
    }
}
