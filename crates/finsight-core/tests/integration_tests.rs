//! Integration tests for finsight-core
//!
//! These tests exercise the full ingest → classify → store → score workflow
//! against a real data directory.

use std::sync::Arc;
use std::thread;

use finsight_core::{
    config::AppConfig,
    ingest::parse_upload,
    service::{Resources, Service, ServiceError},
    BatchMode, Classifier, RawTransaction, INCOME_CATEGORY,
};
use tempfile::TempDir;

/// A month of activity for one user: a paycheck, rent and a few small purchases
fn monthly_upload_csv() -> &'static str {
    r#"date,description,amount
2024-03-01,PAYCHECK DEPOSIT,4000.00
2024-03-02,RENT PAYMENT,1500.00
2024-03-05,SAFEWAY,85.20
2024-03-09,STARBUCKS,6.75
2024-03-12,,19.99
2024-03-15,NETFLIX.COM,15.49"#
}

fn open(dir: &TempDir) -> (Resources, Service) {
    let config = AppConfig::with_data_dir(dir.path()).expect("Failed to build config");
    let resources = Resources::open(&config).expect("Failed to open resources");
    let service = Service::new(&resources);
    (resources, service)
}

// =============================================================================
// Workflow
// =============================================================================

#[test]
fn test_upload_then_report() {
    let dir = TempDir::new().unwrap();
    let (_resources, service) = open(&dir);

    let rows = parse_upload(monthly_upload_csv().as_bytes()).expect("Failed to parse CSV");
    // the row with an empty description is dropped
    assert_eq!(rows.len(), 5);

    assert_eq!(service.upload("user1", &rows).unwrap(), 5);

    let stored = service.dashboard("user1").unwrap();
    let descriptions: Vec<_> = stored.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(
        descriptions,
        vec!["PAYCHECK DEPOSIT", "RENT PAYMENT", "SAFEWAY", "STARBUCKS", "NETFLIX.COM"]
    );
    assert_eq!(stored[0].category, INCOME_CATEGORY);

    let report = service.report("user1").unwrap();
    assert!(report.score <= 100);
    assert!(report.insights[0].starts_with("Great job on your savings rate of"));
    // rent dominates spending
    assert!(report.insights[1].contains("making up"));
}

#[test]
fn test_bulk_load_then_insights() {
    let dir = TempDir::new().unwrap();
    let (_resources, service) = open(&dir);

    let csv = r#"user_id,date,description,amount,category
user1,2024-01-01,PAYCHECK DEPOSIT,1000,Income
user1,2024-01-02,RENT PAYMENT,800,Rent/Mortgage
user1,2024-01-03,SAFEWAY,150,Groceries
user2,2024-01-01,NETFLIX.COM,15.49,Entertainment"#;

    assert_eq!(
        service
            .bulk_reload_csv(csv.as_bytes(), BatchMode::PerRow)
            .unwrap(),
        4
    );

    assert_eq!(
        service.insights("user1").unwrap(),
        vec![
            "Your savings rate is 5.00%, which is low. Try to save at least 10-15% of your income.",
            "Your highest spending category is 'Rent/Mortgage', making up 84.2% of your expenses. Review this for potential savings.",
        ]
    );
    assert_eq!(service.dashboard("user2").unwrap().len(), 1);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_reopen_reuses_key_model_and_data() {
    let dir = TempDir::new().unwrap();

    let fingerprint = {
        let (resources, service) = open(&dir);
        let rows = parse_upload(monthly_upload_csv().as_bytes()).unwrap();
        service.upload("user1", &rows).unwrap();
        resources.cipher.fingerprint().to_string()
    };

    let (resources, service) = open(&dir);
    assert_eq!(resources.cipher.fingerprint(), fingerprint);
    assert!(resources.config.model_file.exists());

    let model_bytes = std::fs::read(&resources.config.model_file).unwrap();
    let stored = service.dashboard("user1").unwrap();
    assert_eq!(stored.len(), 5);

    // classifying again loads the artifact instead of retraining over it
    service.categorize(&["SAFEWAY"]).unwrap();
    assert_eq!(
        std::fs::read(&resources.config.model_file).unwrap(),
        model_bytes
    );
}

#[test]
fn test_retrain_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let (resources, service) = open(&dir);

    service.warm_up().unwrap();
    let before = std::fs::read(&resources.config.model_file).unwrap();
    service.retrain().unwrap();
    let after = std::fs::read(&resources.config.model_file).unwrap();
    assert_eq!(before, after);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_adds_share_one_store() {
    let dir = TempDir::new().unwrap();
    let (_resources, service) = open(&dir);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = service.clone();
            thread::spawn(move || {
                for j in 0..5 {
                    service
                        .add_transaction(RawTransaction {
                            user_id: Some(format!("user{}", i)),
                            date: Some("2024-01-01".to_string()),
                            description: Some(format!("PURCHASE {}", j)),
                            amount: Some(10.0),
                            category: Some("Shopping".to_string()),
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for i in 0..4 {
        let rows = service.dashboard(&format!("user{}", i)).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4].description, "PURCHASE 4");
    }
}

#[test]
fn test_concurrent_first_use_trains_once() {
    let dir = TempDir::new().unwrap();
    let classifier = Arc::new(Classifier::new(
        dir.path().join("model.json"),
        Default::default(),
    ));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let classifier = Arc::clone(&classifier);
            thread::spawn(move || classifier.model().unwrap())
        })
        .collect();

    let models: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

// =============================================================================
// Error boundary
// =============================================================================

#[test]
fn test_validation_errors_reach_caller() {
    let dir = TempDir::new().unwrap();
    let (_resources, service) = open(&dir);

    let err = service
        .upload_csv("user1", "when,what,how much\n2024-01-01,X,1".as_bytes())
        .unwrap_err();
    match err {
        ServiceError::Validation(msg) => {
            assert!(msg.contains("date"));
            assert!(msg.contains("amount"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}
