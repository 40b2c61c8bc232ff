//! End-to-end pipeline tests against an in-memory context

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::runner::PredictionRequest;
use super::state::Stage;
use crate::error::{ClassifierError, FetchError, PipelineError};
use crate::logic::account::{AccountLookup, AccountProfile};
use crate::logic::batch::BatchTable;
use crate::logic::features::{FeatureSchema, OperatorCounters, RawAccountRecord, RawSource};
use crate::logic::model::{Classifier, Label, ModelContext, Normalizer};

/// Fake when the first column exceeds `threshold`; counts invocations
struct FirstAbove {
    threshold: f64,
    calls: Arc<AtomicUsize>,
}

impl Classifier for FirstAbove {
    fn name(&self) -> &str {
        "first-above"
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_raw(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(rows.iter().map(|r| i64::from(r[0] > self.threshold)).collect())
    }
}

/// Always emits the same raw id
struct Emits(i64);

impl Classifier for Emits {
    fn name(&self) -> &str {
        "emits"
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_raw(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, ClassifierError> {
        Ok(vec![self.0; rows.len()])
    }
}

fn context(schema: FeatureSchema, normalizer: Option<Normalizer>, threshold: f64) -> (ModelContext, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let classifier = FirstAbove {
        threshold,
        calls: Arc::clone(&calls),
    };
    let ctx = ModelContext::new(schema, normalizer, Box::new(classifier)).unwrap();
    (ctx, calls)
}

fn profile() -> AccountProfile {
    AccountProfile {
        username: "john123".to_string(),
        followers: 100,
        following: 50,
        ..Default::default()
    }
}

fn counters() -> OperatorCounters {
    OperatorCounters {
        posts: 10,
        mutual_friends: 0,
        threads: 0,
    }
}

fn lexical_table(extra: &str) -> String {
    let header = "profile pic,nums/length username,fullname words,nums/length fullname,name==username,description length,external URL,private,#posts,#followers,#follows,note";
    format!("{}\n1,0.1,2,0,0,10,0,0,5,300,20,{}\n0,0.4,1,0,1,0,0,1,0,12,900,x\n", header, extra)
}

#[test]
fn test_api_request_end_to_end() {
    let (ctx, calls) = context(FeatureSchema::account_counts(), None, 150.0);
    let profile = profile();
    let source = RawSource::Api {
        profile: &profile,
        counters: counters(),
    };

    let mut request = PredictionRequest::new(&ctx);
    let result = request.predict_source(&source).unwrap();

    assert_eq!(result.label, Label::Genuine);
    assert_eq!(result.label_value, 0);
    assert!(result.message.contains("john123"));
    assert_eq!(
        result.vector.as_slice(),
        &[100.0, 50.0, 0.5, 10.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0]
    );
    assert_eq!(result.features[2].name, "Following/Followers");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(
        request.state().stages(),
        vec![Stage::Idle, Stage::RecordReceived, Stage::FeaturesAssembled, Stage::Predicted]
    );
    request.mark_presented().unwrap();
    assert_eq!(request.state().stage(), Stage::Presented);
    assert_eq!(request.state().stages().last(), Some(&Stage::Presented));
}

#[test]
fn test_lookup_result_feeds_request() {
    let (ctx, _) = context(FeatureSchema::account_counts(), None, 150.0);
    let lookup = AccountLookup {
        username: "john123".to_string(),
        profile: profile(),
        payload: serde_json::Value::Null,
    };

    let mut request = PredictionRequest::new(&ctx);
    let lookup = request.receive_lookup(Ok(lookup)).unwrap();
    assert_eq!(request.state().stage(), Stage::Idle);

    let source = RawSource::Api {
        profile: &lookup.profile,
        counters: counters(),
    };
    let result = request.predict_source(&source).unwrap();
    assert_eq!(result.label, Label::Genuine);
    assert_eq!(request.state().stage(), Stage::Predicted);
}

#[test]
fn test_upstream_failure_fails_request() {
    let (ctx, calls) = context(FeatureSchema::account_counts(), None, 150.0);

    let mut request = PredictionRequest::new(&ctx);
    let err = request.receive_lookup(Err(FetchError::NotConfigured)).unwrap_err();

    assert!(matches!(err, PipelineError::UpstreamFetch(_)));
    assert_eq!(request.state().stages(), vec![Stage::Idle, Stage::Failed]);
    assert!(request.state().failure().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // A failed request cannot be resumed or presented
    assert!(request.mark_presented().is_err());
    assert_eq!(request.state().stage(), Stage::Failed);
}

#[test]
fn test_labels_map_to_verdicts() {
    let (ctx, _) = context(FeatureSchema::account_counts(), None, 50.0);
    let profile = profile();
    let source = RawSource::Api {
        profile: &profile,
        counters: counters(),
    };

    let result = PredictionRequest::new(&ctx).predict_source(&source).unwrap();
    assert_eq!(result.label, Label::Fake);
    assert_eq!(result.label.as_str(), "fake");
    assert_eq!(result.label_value, 1);
}

#[test]
fn test_third_label_fails_request() {
    let schema = FeatureSchema::new(["Followers"]).unwrap();
    let ctx = ModelContext::new(schema, None, Box::new(Emits(2))).unwrap();
    let values = BTreeMap::from([("Followers".to_string(), 3.0)]);

    let mut request = PredictionRequest::new(&ctx);
    let err = request.predict_source(&RawSource::Manual(&values)).unwrap_err();

    assert!(matches!(err, PipelineError::ClassifierInvocation(ClassifierError::UnknownLabel(2))));
    assert_eq!(request.state().stage(), Stage::Failed);
    assert!(request.state().failure().is_some());
}

#[test]
fn test_scaled_deployment() {
    let schema = FeatureSchema::new(["Followers", "Following"]).unwrap();
    let norm = Normalizer::from_json_slice(br#"{"mean": [0.0, 0.0], "scale": [100.0, 1.0]}"#).unwrap();
    // 100 raw is above 1.2, but 1.0 once scaled
    let (ctx, _) = context(schema, Some(norm), 1.2);

    let values = BTreeMap::from([("Followers".to_string(), 100.0), ("Following".to_string(), 5.0)]);
    let mut request = PredictionRequest::new(&ctx);
    let result = request
        .predict_record(RawAccountRecord::from_manual(&values), None)
        .unwrap();

    assert_eq!(result.label, Label::Genuine);
    // Reported features stay unscaled
    assert_eq!(result.vector.as_slice(), &[100.0, 5.0]);
    assert!(request.state().stages().contains(&Stage::Scaled));
}

#[test]
fn test_scaled_batch() {
    let schema = FeatureSchema::new(["Followers", "Following"]).unwrap();
    let norm = Normalizer::from_json_slice(br#"{"mean": [0.0, 0.0], "scale": [100.0, 1.0]}"#).unwrap();
    let (ctx, calls) = context(schema, Some(norm), 1.2);
    // Raw followers 100 and 500 are both above 1.2; scaled they become 1.0 and 5.0
    let table = BatchTable::from_csv_str("Followers,Following\n100,5\n500,5\n").unwrap();

    let mut request = PredictionRequest::new(&ctx);
    let batch = request.predict_table(&table).unwrap();

    assert_eq!(batch.labels, vec![Label::Genuine, Label::Fake]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        request.state().stages(),
        vec![
            Stage::Idle,
            Stage::RecordReceived,
            Stage::FeaturesAssembled,
            Stage::Scaled,
            Stage::Predicted
        ]
    );
}

#[test]
fn test_missing_feature_never_reaches_classifier() {
    let (ctx, calls) = context(FeatureSchema::account_counts(), None, 0.0);
    let values = BTreeMap::from([("Followers".to_string(), 10.0)]);

    let mut request = PredictionRequest::new(&ctx);
    let err = request
        .predict_record(RawAccountRecord::from_manual(&values), None)
        .unwrap_err();

    assert!(matches!(err, PipelineError::MissingFeature { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(request.state().stage(), Stage::Failed);
}

#[test]
fn test_request_runs_once() {
    let schema = FeatureSchema::new(["Followers"]).unwrap();
    let (ctx, _) = context(schema, None, 0.0);
    let values = BTreeMap::from([("Followers".to_string(), 3.0)]);

    let mut request = PredictionRequest::new(&ctx);
    request.predict_source(&RawSource::Manual(&values)).unwrap();
    assert!(matches!(
        request.predict_source(&RawSource::Manual(&values)),
        Err(PipelineError::InvalidTransition { .. })
    ));
}

#[test]
fn test_batch_missing_column_skips_prediction() {
    let (ctx, calls) = context(FeatureSchema::lexical(), None, 0.5);
    let text = lexical_table("a").replace("#followers,", "");
    // Drop the matching cells so rows stay rectangular
    let text: String = text
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                return format!("{}\n", line);
            }
            let mut cells: Vec<&str> = line.split(',').collect();
            cells.remove(9);
            format!("{}\n", cells.join(","))
        })
        .collect();
    let table = BatchTable::from_csv_str(&text).unwrap();
    let before = table.clone();

    let mut request = PredictionRequest::new(&ctx);
    let err = request.predict_table(&table).unwrap_err();

    match err {
        PipelineError::MissingColumns(missing) => assert_eq!(missing.missing, vec!["#followers"]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(table, before);
    assert_eq!(request.state().stage(), Stage::Failed);
}

#[test]
fn test_batch_prediction_appends_column() {
    let (ctx, calls) = context(FeatureSchema::lexical(), None, 0.5);
    let table = BatchTable::from_csv_str(&lexical_table("keep me")).unwrap();

    let batch = PredictionRequest::new(&ctx).predict_table(&table).unwrap();
    assert_eq!(batch.labels, vec![Label::Fake, Label::Genuine]);
    assert_eq!((batch.genuine_count, batch.fake_count), (1, 1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let out = batch.table.to_csv_string().unwrap();
    let mut lines = out.lines();
    assert!(lines.next().unwrap().ends_with(",note,predict"));
    assert!(lines.next().unwrap().ends_with(",keep me,1"));
    assert!(lines.next().unwrap().ends_with(",x,0"));
}

#[test]
fn test_predict_csv_upload() {
    let (ctx, _) = context(FeatureSchema::lexical(), None, 0.5);
    let body = lexical_table("keep me");

    let mut request = PredictionRequest::new(&ctx);
    let batch = request.predict_csv(body.as_bytes()).unwrap();
    assert_eq!(batch.labels, vec![Label::Fake, Label::Genuine]);

    request.mark_presented().unwrap();
    assert_eq!(request.state().stage(), Stage::Presented);
}

#[test]
fn test_malformed_upload_fails_request() {
    let (ctx, calls) = context(FeatureSchema::new(["a"]).unwrap(), None, 0.5);

    let mut request = PredictionRequest::new(&ctx);
    let err = request.predict_csv(&b"a,b\n1,2,3\n"[..]).unwrap_err();

    assert!(matches!(err, PipelineError::MalformedTable(_)));
    assert_eq!(request.state().stages(), vec![Stage::Idle, Stage::Failed]);
    assert!(request.state().failure().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_batch_non_numeric_cell() {
    let (ctx, _) = context(FeatureSchema::lexical(), None, 0.5);
    let text = lexical_table("a").replacen(",5,300,", ",five,300,", 1);
    let table = BatchTable::from_csv_str(&text).unwrap();

    let err = PredictionRequest::new(&ctx).predict_table(&table).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidValue { ref feature, .. } if feature == "#posts"));
}

#[test]
fn test_empty_batch() {
    let (ctx, calls) = context(FeatureSchema::new(["a"]).unwrap(), None, 0.5);
    let table = BatchTable::from_csv_str("a,b\n").unwrap();

    let batch = PredictionRequest::new(&ctx).predict_table(&table).unwrap();
    assert!(batch.labels.is_empty());
    assert_eq!(batch.table.to_csv_string().unwrap(), "a,b,predict\n");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
