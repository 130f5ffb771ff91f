//! End-to-end scoring tests with in-memory classifiers

mod common;

use common::*;
use fraud_scoring_pipeline::encoder::SENTINEL_CODE;
use fraud_scoring_pipeline::{CategoricalField, ScoringError, TransactionTable, Verdict};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn table(rows: &[&str]) -> TransactionTable {
    let mut csv = format!("{}\n", BATCH_HEADER);
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    TransactionTable::from_reader(csv.as_bytes()).unwrap()
}

#[test]
fn test_quickmart_scenario() {
    let (pipeline, _) = pipeline_with(Arc::new(RuleClassifier::default()));

    let scored = pipeline.score_transaction(&quickmart()).unwrap();
    let f = scored.features;

    assert_eq!(f.merchant, 1);
    assert_eq!(f.category, 1);
    assert_eq!(f.gender, 1);
    assert_eq!(f.amt, 45.20);
    assert!(f.distance > 2.0 && f.distance < 2.3, "distance {}", f.distance);
    assert!(f.cc_num < 100);
    assert_eq!(scored.verdict, Verdict::Legitimate);
    assert!(scored.unseen.is_empty());

    let again = pipeline.score_transaction(&quickmart()).unwrap();
    assert_eq!(again, scored);
}

#[test]
fn test_single_and_batch_assemble_identically() {
    let classifier = Arc::new(RuleClassifier::default());
    let (pipeline, _) = pipeline_with(classifier.clone());

    let single = pipeline.score_transaction(&quickmart()).unwrap();
    let batch = pipeline.score_table(&table(&[QUICKMART_ROW])).unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(batch.rows()[0].row.features, single.features);
    assert_eq!(batch.rows()[0].verdict, single.verdict);

    let seen = classifier.seen.lock().unwrap();
    assert_eq!(seen[0][0].to_array(), seen[1][0].to_array());
}

#[test]
fn test_unseen_merchant_in_middle_row() {
    let (pipeline, metrics) = pipeline_with(Arc::new(RuleClassifier::default()));

    let scored = pipeline
        .score_table(&table(&[
            "QuickMart,grocery,12.50,40.7128,-74.0060,40.7300,-73.9950,10,1,2,F,4000000000000001",
            "Corner Deli,grocery,900.00,40.7128,-74.0060,40.7300,-73.9950,2,1,2,M,4000000000000002",
            "BigBox,gas_transport,60.00,40.7128,-74.0060,40.7300,-73.9950,18,1,2,F,4000000000000003",
        ]))
        .unwrap();

    let merchants: Vec<i64> = scored.rows().iter().map(|r| r.row.features.merchant).collect();
    assert_eq!(merchants, vec![1, SENTINEL_CODE, 0]);
    assert_eq!(scored.rows()[1].row.unseen, vec![CategoricalField::Merchant]);

    assert_eq!(
        scored.verdicts(),
        vec![Verdict::Legitimate, Verdict::Fraudulent, Verdict::Legitimate]
    );
    assert_eq!(metrics.unseen_count(CategoricalField::Merchant), 1);
    assert_eq!(metrics.transactions_scored.load(Ordering::Relaxed), 3);
}

#[test]
fn test_batch_missing_merch_lat_rejected() {
    let classifier = Arc::new(RuleClassifier::default());
    let (pipeline, metrics) = pipeline_with(classifier.clone());

    let csv = "merchant,category,amt,lat,long,merch_long,hour,day,month,gender,cc_num\n\
               QuickMart,grocery,45.20,40.7128,-74.0060,-73.9950,14,10,3,Female,4111111111111111\n";
    let table = TransactionTable::from_reader(csv.as_bytes()).unwrap();

    match pipeline.score_table(&table) {
        Err(ScoringError::Schema { missing }) => assert_eq!(missing, vec!["merch_lat"]),
        other => panic!("expected schema error, got {:?}", other),
    }
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    assert_eq!(metrics.schema_rejections.load(Ordering::Relaxed), 1);
}

#[test]
fn test_scoring_batch_twice_is_idempotent() {
    let (pipeline, _) = pipeline_with(Arc::new(RuleClassifier::default()));
    let table = table(&[
        QUICKMART_ROW,
        "fraud_Kirlin and Sons,shopping_net,1200.00,40.7128,-74.0060,41.5,-73.0,1,5,6,M,4000000000000009",
    ]);

    let first = pipeline.score_table(&table).unwrap();
    let second = pipeline.score_table(&table).unwrap();

    assert_eq!(first.verdicts(), second.verdicts());
    assert_eq!(first, second);
}

#[test]
fn test_csv_round_through_pipeline() {
    let (pipeline, _) = pipeline_with(Arc::new(RuleClassifier::default()));
    let input = format!(
        "{}\n{}\nfraud_Kirlin and Sons,shopping_net,1200.00,40.7128,-74.0060,40.7128,-74.0060,1,5,6,M,42\n",
        BATCH_HEADER, QUICKMART_ROW
    );

    let table = TransactionTable::from_reader(input.as_bytes()).unwrap();
    let scored = pipeline.score_table(&table).unwrap();
    assert_eq!(scored.len(), 2);

    let mut out = Vec::new();
    scored.write_csv(&mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "merchant,category,amt,distance,hour,day,month,gender,cc_num,Prediction"
    );
    assert!(lines[1].starts_with("1,1,45.2,"));
    assert!(lines[1].ends_with(",14,10,3,1,80,Legitimate"));
    assert!(lines[2].starts_with("2,2,1200,"));
    assert!(lines[2].ends_with(",1,5,6,2,88,Fraudulent"));
    assert!(!text.contains("lat"));
    assert!(!text.contains("4111111111111111"));
}

#[test]
fn test_extra_columns_pass_through_next_to_prediction() {
    let (pipeline, _) = pipeline_with(Arc::new(RuleClassifier::default()));
    let input = format!(
        "trans_num,{}\nT-777,{}\nT-778,fraud_Kirlin and Sons,shopping_net,1200.00,40.7128,-74.0060,40.7128,-74.0060,1,5,6,M,42\n",
        BATCH_HEADER, QUICKMART_ROW
    );

    let table = TransactionTable::from_reader(input.as_bytes()).unwrap();
    let mut out = Vec::new();
    pipeline.score_table(&table).unwrap().write_csv(&mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "trans_num,merchant,category,amt,distance,hour,day,month,gender,cc_num,Prediction"
    );
    assert!(lines[1].starts_with("T-777,1,1,45.2,"));
    assert!(lines[1].ends_with(",14,10,3,1,80,Legitimate"));
    assert!(lines[2].starts_with("T-778,2,2,1200,"));
    assert!(lines[2].ends_with(",Fraudulent"));
}

#[test]
fn test_single_transaction_missing_fields() {
    let classifier = Arc::new(RuleClassifier::default());
    let (pipeline, metrics) = pipeline_with(classifier.clone());

    let mut tx = quickmart();
    tx.merchant = String::new();
    tx.cc_num = String::new();

    let err = pipeline.score_transaction(&tx).unwrap_err();
    assert!(matches!(err, ScoringError::Validation(_)));
    assert!(err.to_string().contains("merchant, cc_num"));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    assert_eq!(metrics.validation_rejections.load(Ordering::Relaxed), 1);
}

#[test]
fn test_model_failure_is_reported() {
    let (pipeline, metrics) = pipeline_with(Arc::new(FailingClassifier));

    let err = pipeline.score_transaction(&quickmart()).unwrap_err();
    assert!(matches!(err, ScoringError::ModelInvocation(_)));
    assert!(err.to_string().contains("input shape mismatch"));

    let err = pipeline.score_table(&table(&[QUICKMART_ROW])).unwrap_err();
    assert!(matches!(err, ScoringError::ModelInvocation(_)));
    assert_eq!(metrics.model_failures.load(Ordering::Relaxed), 2);
}

#[test]
fn test_invalid_coordinates_rejected_before_model() {
    let classifier = Arc::new(RuleClassifier::default());
    let (pipeline, _) = pipeline_with(classifier.clone());

    let mut tx = quickmart();
    tx.merch_lat = 140.0;

    let err = pipeline.score_transaction(&tx).unwrap_err();
    assert!(err.to_string().contains("distance"));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_empty_batch_scores_nothing() {
    let classifier = Arc::new(RuleClassifier::default());
    let (pipeline, _) = pipeline_with(classifier.clone());

    let scored = pipeline.score_table(&table(&[])).unwrap();
    assert!(scored.is_empty());
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}
