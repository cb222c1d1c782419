//! Shared fixtures for unit tests

use citegraph_common::fetcher::RawPayload;
use serde_json::{json, Value};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub(crate) fn payload(value: Value) -> RawPayload {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture is not an object: {other}"),
    }
}

/// Complete upstream payload for `arxiv_id` with the given neighbor lists
pub(crate) fn paper_json(arxiv_id: &str, citations: Vec<Value>, references: Vec<Value>) -> Value {
    json!({
        "abstract": format!("Abstract of {arxiv_id}"),
        "arxivId": arxiv_id,
        "authors": [{ "authorId": "1846258", "name": "Ashish Vaswani", "url": "https://www.semanticscholar.org/author/1846258" }],
        "citations": citations,
        "doi": null,
        "fieldsOfStudy": ["Computer Science"],
        "influentialCitationCount": 7,
        "paperId": format!("s2-{arxiv_id}"),
        "references": references,
        "title": format!("Paper {arxiv_id}"),
        "topics": [{ "topic": "Transformer", "topicId": "3380", "url": "https://www.semanticscholar.org/topic/3380" }],
        "url": format!("https://www.semanticscholar.org/arxiv/{arxiv_id}"),
        "venue": "NeurIPS",
        "year": 2017
    })
}

/// Citation or reference entry as the provider lists it
pub(crate) fn neighbor(arxiv_id: Option<&str>, influential: bool) -> Value {
    let label = arxiv_id.unwrap_or("no-arxiv");
    json!({
        "arxivId": arxiv_id,
        "authors": [{ "authorId": "40348417", "name": "Jacob Devlin", "url": null }],
        "doi": null,
        "intent": ["background"],
        "isInfluential": influential,
        "paperId": format!("s2-{label}"),
        "title": format!("Neighbor {label}"),
        "url": format!("https://www.semanticscholar.org/paper/{label}"),
        "venue": "ArXiv",
        "year": 2019
    })
}

/// Collects the `diagnostic` field of every event
struct DiagnosticCapture {
    seen: Arc<Mutex<Vec<String>>>,
}

struct DiagnosticVisitor(Option<String>);

impl Visit for DiagnosticVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "diagnostic" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "diagnostic" {
            self.0 = Some(format!("{value:?}").trim_matches('"').to_string());
        }
    }
}

impl<S: Subscriber> Layer<S> for DiagnosticCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = DiagnosticVisitor(None);
        event.record(&mut visitor);
        if let Some(diagnostic) = visitor.0 {
            self.seen.lock().unwrap().push(diagnostic);
        }
    }
}

/// Route this thread's events into a diagnostic log until the guard drops
pub(crate) fn capture_diagnostics() -> (DefaultGuard, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(DiagnosticCapture { seen: seen.clone() });
    (tracing::subscriber::set_default(subscriber), seen)
}
