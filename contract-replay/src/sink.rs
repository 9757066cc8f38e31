//! Where the replayer reports what it finds.

use crate::{
    message::error::Error as ReconstructError,
    replayer::Stage,
    summary::RunSummary,
    validator::{AdvisoryWarning, ConformanceError},
};

/// Receives every diagnostic of a replay run. Entry numbers are 1-based.
pub trait DiagnosticSink {
    fn advisory(&mut self, warning: &AdvisoryWarning);
    fn loaded(&mut self, entries: usize);
    fn skipped(&mut self, entry: usize, stage: Stage, error: &ReconstructError);
    fn request_invalid(&mut self, entry: usize, errors: &[ConformanceError]);
    fn response_invalid(&mut self, entry: usize, errors: &[ConformanceError]);
    fn classified(&mut self, _entry: usize, _valid: bool) {}
    fn summary(&mut self, summary: &RunSummary);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticSink for TracingSink {
    fn advisory(&mut self, warning: &AdvisoryWarning) {
        tracing::warn!("Validator creation warning: {}", warning);
    }

    fn loaded(&mut self, entries: usize) {
        tracing::info!(entries, "Loaded {} requests for validation", entries);
    }

    fn skipped(&mut self, entry: usize, stage: Stage, error: &ReconstructError) {
        let what = match stage {
            Stage::Pending => "request",
            Stage::RequestValidated => "response",
        };
        tracing::warn!(entry, ?stage, "Error creating HTTP {} {}: {}", what, entry, error);
    }

    fn request_invalid(&mut self, entry: usize, errors: &[ConformanceError]) {
        tracing::info!(entry, errors = errors.len(), "Request {} validation failed:", entry);
        for error in errors {
            tracing::info!(entry, kind = ?error.kind, "  - {}", error);
        }
    }

    fn response_invalid(&mut self, entry: usize, errors: &[ConformanceError]) {
        tracing::info!(entry, errors = errors.len(), "Response {} validation failed:", entry);
        for error in errors {
            tracing::info!(entry, kind = ?error.kind, "  - {}", error);
        }
    }

    fn classified(&mut self, entry: usize, valid: bool) {
        tracing::debug!(entry, valid, "Entry {} classified", entry);
    }

    fn summary(&mut self, summary: &RunSummary) {
        tracing::info!(
            total = summary.total,
            valid = summary.valid,
            invalid = summary.invalid,
            skipped = summary.skipped(),
            "Validation Summary: total requests {}, valid {}, invalid {}",
            summary.total,
            summary.valid,
            summary.invalid
        );
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Advisory(String),
    Loaded(usize),
    Skipped(usize, Stage, String),
    RequestInvalid(usize, Vec<ConformanceError>),
    ResponseInvalid(usize, Vec<ConformanceError>),
    Classified(usize, bool),
    Summary(RunSummary),
}

/// Keeps every diagnostic in memory, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<Event>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skipped_entries(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Skipped(entry, _, _) => Some(*entry),
                _ => None,
            })
            .collect()
    }

    pub fn conformance_errors(&self) -> Vec<&ConformanceError> {
        self.events
            .iter()
            .flat_map(|event| match event {
                Event::RequestInvalid(_, errors) | Event::ResponseInvalid(_, errors) => {
                    errors.iter().collect()
                }
                _ => Vec::new(),
            })
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn advisory(&mut self, warning: &AdvisoryWarning) {
        self.events.push(Event::Advisory(warning.to_string()));
    }

    fn loaded(&mut self, entries: usize) {
        self.events.push(Event::Loaded(entries));
    }

    fn skipped(&mut self, entry: usize, stage: Stage, error: &ReconstructError) {
        self.events
            .push(Event::Skipped(entry, stage, error.to_string()));
    }

    fn request_invalid(&mut self, entry: usize, errors: &[ConformanceError]) {
        self.events
            .push(Event::RequestInvalid(entry, errors.to_vec()));
    }

    fn response_invalid(&mut self, entry: usize, errors: &[ConformanceError]) {
        self.events
            .push(Event::ResponseInvalid(entry, errors.to_vec()));
    }

    fn classified(&mut self, entry: usize, valid: bool) {
        self.events.push(Event::Classified(entry, valid));
    }

    fn summary(&mut self, summary: &RunSummary) {
        self.events.push(Event::Summary(*summary));
    }
}
