use std::sync::Arc;
use std::time::Duration;

use ieeepaper::document::{Document, parse_document};
use ieeepaper::export::PdfConverter;
use ieeepaper::service::{
    ExportService, InMemoryEmailDispatcher, InMemoryRecordStore, ServiceError,
    StaticIdentityProvider, UserIdentity,
};
use ieeepaper::{ExportError, ExportFormat, Exporter};

fn fixture() -> Document {
    parse_document(include_str!("fixtures/paper.json")).unwrap()
}

fn identities() -> Arc<StaticIdentityProvider> {
    Arc::new(StaticIdentityProvider::new().with_user(
        "token-1",
        UserIdentity {
            user_id: "u-1".to_string(),
            email: Some("ada@example.edu".to_string()),
            display_name: Some("Ada".to_string()),
        },
    ))
}

struct SlowConverter;

impl PdfConverter for SlowConverter {
    fn convert(&self, _docx: &[u8]) -> ieeepaper::error::Result<Vec<u8>> {
        std::thread::sleep(Duration::from_millis(500));
        Ok(b"%PDF-1.7".to_vec())
    }
}

async fn wait_for_mail(mailbox: &InMemoryEmailDispatcher) {
    for _ in 0..100 {
        if !mailbox.sent().is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[test]
fn test_export_sanitizes_and_records_metadata() {
    let records = Arc::new(InMemoryRecordStore::default());
    let service = ExportService::new(Exporter::default(), identities(), records.clone());

    let exported = service
        .export("token-1", &fixture(), ExportFormat::Docx)
        .unwrap();
    assert!(!exported.is_empty());

    let stored = records.records();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].user_id, "u-1");
    assert_eq!(stored[0].title, "Adaptive Scheduling for Edge Clusters");
    assert_eq!(stored[0].format, ExportFormat::Docx);
    assert_eq!(stored[0].byte_len, exported.len());
    assert_eq!(stored[0].filename, exported.filename);
}

#[test]
fn test_unknown_token_is_rejected() {
    let records = Arc::new(InMemoryRecordStore::default());
    let service = ExportService::new(Exporter::default(), identities(), records.clone());

    let err = service
        .export("wrong", &fixture(), ExportFormat::Docx)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized));
    assert!(records.records().is_empty());
}

#[test]
fn test_without_sanitize_surfaces_malformed_table() {
    let records = Arc::new(InMemoryRecordStore::default());
    let service =
        ExportService::new(Exporter::default(), identities(), records.clone()).without_sanitize();

    let err = service
        .export("token-1", &fixture(), ExportFormat::Docx)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Export(ExportError::MalformedTable { .. })
    ));
    assert!(records.records().is_empty());
}

#[test]
fn test_validate_does_not_need_identity() {
    let service = ExportService::new(
        Exporter::default(),
        identities(),
        Arc::new(InMemoryRecordStore::default()),
    );
    assert!(!service.validate(&fixture()).is_valid);
}

#[tokio::test]
async fn test_async_export_mails_the_caller() {
    let mailbox = Arc::new(InMemoryEmailDispatcher::default());
    let service = ExportService::new(
        Exporter::default(),
        identities(),
        Arc::new(InMemoryRecordStore::default()),
    )
    .with_email(mailbox.clone());

    let exported = service
        .export_async("token-1", fixture(), ExportFormat::Docx, None)
        .await
        .unwrap();

    wait_for_mail(&mailbox).await;
    let sent = mailbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada@example.edu");
    assert_eq!(sent[0].filename, exported.filename);
    assert_eq!(sent[0].attachment, exported.bytes);
    assert_eq!(sent[0].media_type, exported.media_type());
}

#[tokio::test]
async fn test_async_export_prefers_explicit_recipient() {
    let mailbox = Arc::new(InMemoryEmailDispatcher::default());
    let service = ExportService::new(
        Exporter::default(),
        identities(),
        Arc::new(InMemoryRecordStore::default()),
    )
    .with_email(mailbox.clone());

    service
        .export_async(
            "token-1",
            fixture(),
            ExportFormat::Latex,
            Some("editor@example.org".to_string()),
        )
        .await
        .unwrap();

    wait_for_mail(&mailbox).await;
    assert_eq!(mailbox.sent()[0].to, "editor@example.org");
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_export() {
    let mailbox = Arc::new(InMemoryEmailDispatcher::failing());
    let records = Arc::new(InMemoryRecordStore::default());
    let service = ExportService::new(Exporter::default(), identities(), records.clone())
        .with_email(mailbox.clone());

    let result = service
        .export_async("token-1", fixture(), ExportFormat::Docx, None)
        .await;
    assert!(result.is_ok());
    assert_eq!(records.records().len(), 1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(mailbox.sent().is_empty());
}

#[tokio::test]
async fn test_async_export_times_out() {
    let exporter = Exporter::default().with_pdf_converter(Arc::new(SlowConverter));
    let records = Arc::new(InMemoryRecordStore::default());
    let service = ExportService::new(exporter, identities(), records.clone())
        .with_timeout(Duration::from_millis(50));

    let err = service
        .export_async("token-1", fixture(), ExportFormat::Pdf, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Export(ExportError::TimedOut(limit)) if limit == Duration::from_millis(50)
    ));
    assert!(records.records().is_empty());
}

#[tokio::test]
async fn test_async_pdf_export_through_converter() {
    let exporter = Exporter::default().with_pdf_converter(Arc::new(SlowConverter));
    let service = ExportService::new(
        exporter,
        identities(),
        Arc::new(InMemoryRecordStore::default()),
    );

    let exported = service
        .export_async("token-1", fixture(), ExportFormat::Pdf, None)
        .await
        .unwrap();
    assert!(exported.bytes.starts_with(b"%PDF"));
    assert_eq!(exported.filename, "Adaptive_Scheduling_for_Edge_Clusters.pdf");
}
