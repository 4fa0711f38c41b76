use std::error::Error;
use std::fs;
use std::io::Write;

use tempfile::{tempdir, NamedTempFile};
use ticket_triage::{
    pipeline, DatasetError, ModelStore, TicketClassifier, TrainingOptions, TriageError,
};

const HEADER: &str = "Ticket_ID,Subject,Description,Category,Priority,Timestamp";

const ROWS: [(&str, &str, &str); 15] = [
    ("App crash on login", "The app crashes right after login", "Bug Report"),
    ("Crash when saving", "Saving a file crashes the editor", "Bug Report"),
    ("Error after update", "Update causes crash on startup", "Bug Report"),
    ("Add CSV export", "Please add export to CSV", "Feature Request"),
    ("Dark mode", "Feature request for a dark mode theme", "Feature Request"),
    ("Calendar integration", "Request to add calendar export feature", "Feature Request"),
    ("VPN fails to connect", "VPN connection times out", "Technical Issue"),
    ("Sync is slow", "Network sync takes hours to connect", "Technical Issue"),
    ("Email not delivered", "Outgoing email stuck, network timeout", "Technical Issue"),
    ("Charged twice", "Duplicate charge on my credit card", "Billing Inquiry"),
    ("Refund request", "Invoice charge was wrong, need refund", "Billing Inquiry"),
    ("Payment declined", "Card payment declined on invoice", "Billing Inquiry"),
    ("Password reset issue", "Cannot reset account password", "Account Management"),
    ("Change account email", "Update the email on my account profile", "Account Management"),
    ("Delete my account", "Please close my account and profile", "Account Management"),
];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_csv(header: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "{}", header)?;
    for (i, (subject, description, category)) in ROWS.iter().enumerate() {
        writeln!(
            file,
            "T{:03},{},{},{},Medium,2024-01-{:02}",
            i,
            subject,
            description.replace(',', ""),
            category,
            i % 28 + 1
        )?;
    }
    file.flush()?;
    Ok(file)
}

#[test]
fn test_train_then_evaluate_from_disk() -> Result<(), Box<dyn Error>> {
    init_logger();
    let data = write_csv(HEADER)?;
    let dir = tempdir()?;
    let model_path = dir.path().join("models").join("model.bin");

    let outcome = pipeline::train_to_path(data.path(), &model_path, &TrainingOptions::default())?;
    // One ticket per category is held out
    assert_eq!(outcome.n_test, 5);
    assert_eq!(outcome.n_train, 10);
    assert_eq!(outcome.metrics.total, 5);
    assert!(model_path.exists());

    let metrics = pipeline::evaluate_path(data.path(), &model_path)?;
    assert_eq!(metrics.total, ROWS.len());
    assert!((0.0..=1.0).contains(&metrics.accuracy));
    assert_eq!(metrics.per_class.len(), 5);

    // The persisted bundle behaves like the one returned by training
    let classifier = TicketClassifier::load(&model_path)?;
    for (subject, description, _) in ROWS.iter() {
        let text = format!("{} {}", subject, description);
        assert_eq!(
            classifier.predict(subject, description).category,
            outcome.bundle.predict_label(&text)
        );
    }
    Ok(())
}

#[test]
fn test_training_is_reproducible() -> Result<(), Box<dyn Error>> {
    let data = write_csv(HEADER)?;
    let dir = tempdir()?;
    let options = TrainingOptions::default();

    let first = pipeline::train_to_path(data.path(), dir.path().join("a.bin"), &options)?;
    let second = pipeline::train_to_path(data.path(), dir.path().join("b.bin"), &options)?;
    assert_eq!(first.bundle, second.bundle);
    assert_eq!(first.metrics, second.metrics);
    Ok(())
}

#[test]
fn test_missing_category_column_fails_before_training() -> Result<(), Box<dyn Error>> {
    let data = write_csv("Ticket_ID,Subject,Description,Label,Priority,Timestamp")?;
    let dir = tempdir()?;
    let model_path = dir.path().join("model.bin");

    let err = pipeline::train_to_path(data.path(), &model_path, &TrainingOptions::default())
        .unwrap_err();
    match err {
        TriageError::Dataset(DatasetError::Schema { missing }) => {
            assert_eq!(missing, vec!["Category".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!model_path.exists());
    Ok(())
}

#[test]
fn test_evaluate_with_missing_model() -> Result<(), Box<dyn Error>> {
    let data = write_csv(HEADER)?;
    let dir = tempdir()?;
    let err = pipeline::evaluate_path(data.path(), dir.path().join("absent.bin")).unwrap_err();
    assert!(matches!(err, TriageError::Model(_)));
    Ok(())
}

#[test]
fn test_evaluation_report_is_written_as_json() -> Result<(), Box<dyn Error>> {
    let data = write_csv(HEADER)?;
    let dir = tempdir()?;
    let model_path = dir.path().join("model.bin");
    pipeline::train_to_path(data.path(), &model_path, &TrainingOptions::default())?;

    let metrics = pipeline::evaluate_path(data.path(), &model_path)?;
    let report_path = dir.path().join("reports").join("eval").join("metrics.json");
    metrics.write_json(&report_path)?;

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
    assert_eq!(report["accuracy"].as_f64(), Some(metrics.accuracy));
    assert_eq!(report["per_class"].as_array().map(Vec::len), Some(5));
    assert!(report["macro_avg"]["f1"].is_number());
    assert!(ModelStore::load(&model_path).is_ok());
    Ok(())
}
