//! Drives reconstruction and validation over a whole transcript.

use crate::{
    contract::Contract,
    error::Error,
    message::{build_request, build_response},
    replay_configuration::{ReplayConfiguration, SkipPolicy},
    sink::DiagnosticSink,
    summary::RunSummary,
    transcript::{load_transcript, TranscriptEntry},
    validator::{ConformanceError, ContractValidator, Validator},
};
use std::path::Path;

/// How far a skipped entry got.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    /// The request could not be rebuilt.
    Pending,
    /// The request was checked, then its response could not be rebuilt.
    RequestValidated,
}

/// Conformance errors of one entry, folded into the tally and then dropped.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub request_errors: Vec<ConformanceError>,
    pub response_errors: Vec<ConformanceError>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.request_errors.is_empty() && self.response_errors.is_empty()
    }
}

pub struct Replayer<'a, V: Validator + ?Sized, S: DiagnosticSink + ?Sized> {
    validator: &'a V,
    configuration: &'a ReplayConfiguration,
    sink: &'a mut S,
}

impl<'a, V: Validator + ?Sized, S: DiagnosticSink + ?Sized> Replayer<'a, V, S> {
    pub fn new(validator: &'a V, configuration: &'a ReplayConfiguration, sink: &'a mut S) -> Self {
        Self {
            validator,
            configuration,
            sink,
        }
    }

    pub fn run(&mut self, entries: &[TranscriptEntry]) -> RunSummary {
        let mut summary = RunSummary::new(entries.len());
        self.sink.loaded(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let number = index + 1;
            if let Some(outcome) = self.replay_entry(number, entry) {
                let valid = outcome.is_valid();
                if valid {
                    summary.record_valid();
                } else {
                    summary.record_invalid();
                }
                self.sink.classified(number, valid);
            }
        }

        self.sink.summary(&summary);
        summary
    }

    /// `None` when the entry is skipped.
    fn replay_entry(&mut self, number: usize, entry: &TranscriptEntry) -> Option<ValidationOutcome> {
        let mut outcome = ValidationOutcome::default();

        let request = match build_request(&entry.request) {
            Ok(request) => request,
            Err(e) => {
                self.sink.skipped(number, Stage::Pending, &e);
                return None;
            }
        };

        outcome.request_errors = self.validator.validate_request(&request);
        if !outcome.request_errors.is_empty() {
            self.sink.request_invalid(number, &outcome.request_errors);
        }

        let response = match build_response(&entry.response, &request) {
            Ok(response) => response,
            Err(e) => {
                self.sink.skipped(number, Stage::RequestValidated, &e);
                return match self.configuration.skip_policy() {
                    SkipPolicy::KeepRequestErrors if !outcome.request_errors.is_empty() => {
                        Some(outcome)
                    }
                    _ => None,
                };
            }
        };

        outcome.response_errors = self.validator.validate_response(&request, &response);
        if !outcome.response_errors.is_empty() {
            self.sink.response_invalid(number, &outcome.response_errors);
        }

        Some(outcome)
    }
}

/// Loads both files, builds the validator and replays every entry.
pub fn replay_files<T: AsRef<Path>, C: AsRef<Path>, S: DiagnosticSink + ?Sized>(
    transcript_path: T,
    contract_path: C,
    configuration: &ReplayConfiguration,
    sink: &mut S,
) -> Result<RunSummary, Error> {
    let contract = Contract::load(contract_path)?;
    let (validator, warnings) = ContractValidator::build(&contract)?;
    for warning in &warnings {
        sink.advisory(warning);
    }

    let entries = load_transcript(transcript_path)?;

    Ok(Replayer::new(&validator, configuration, sink).run(&entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        message::SyntheticRequest,
        message::SyntheticResponse,
        sink::{Event, MemorySink},
        transcript::decode,
        validator::ErrorKind,
    };

    /// Rejects any request to `/bad` and any 5xx response.
    struct PickyValidator;

    impl Validator for PickyValidator {
        fn validate_request(&self, request: &SyntheticRequest) -> Vec<ConformanceError> {
            if request.uri().path() == "/bad" {
                vec![ConformanceError::new(ErrorKind::PathNotFound, "bad path", "")]
            } else {
                Vec::new()
            }
        }

        fn validate_response(
            &self,
            _request: &SyntheticRequest,
            response: &SyntheticResponse<'_>,
        ) -> Vec<ConformanceError> {
            if response.status().is_server_error() {
                vec![ConformanceError::new(ErrorKind::UndefinedStatus, "server error", "")]
            } else {
                Vec::new()
            }
        }
    }

    fn entries(json: &str) -> Vec<TranscriptEntry> {
        decode(json.as_bytes()).unwrap()
    }

    fn run(entries: &[TranscriptEntry], configuration: &ReplayConfiguration) -> (RunSummary, MemorySink) {
        let mut sink = MemorySink::new();
        let summary = Replayer::new(&PickyValidator, configuration, &mut sink).run(entries);
        (summary, sink)
    }

    #[test]
    fn tallies_valid_and_invalid_entries() {
        let entries = entries(
            r#"[
                {"request": {"method": "GET", "path": "/ok"}, "response": {"status": 200}},
                {"request": {"method": "GET", "path": "/bad"}, "response": {"status": 200}},
                {"request": {"method": "GET", "path": "/ok"}, "response": {"status": 503}}
            ]"#,
        );

        let (summary, sink) = run(&entries, &ReplayConfiguration::new());

        assert_eq!(summary, RunSummary { total: 3, valid: 1, invalid: 2 });
        assert_eq!(sink.events.first(), Some(&Event::Loaded(3)));
        assert_eq!(sink.events.last(), Some(&Event::Summary(summary)));
        assert_eq!(sink.conformance_errors().len(), 2);
    }

    #[test]
    fn request_and_response_errors_are_both_reported() {
        let entries = entries(
            r#"[{"request": {"method": "GET", "path": "/bad"}, "response": {"status": 500}}]"#,
        );

        let (summary, sink) = run(&entries, &ReplayConfiguration::new());

        assert_eq!(summary.invalid, 1);
        assert!(matches!(sink.events[1], Event::RequestInvalid(1, _)));
        assert!(matches!(sink.events[2], Event::ResponseInvalid(1, _)));
    }

    #[test]
    fn unbuildable_request_skips_the_entry() {
        let entries = entries(
            r#"[
                {"request": {"method": "GET", "path": "://bad"}, "response": {"status": 200}},
                {"request": {"method": "GET", "path": "/ok"}, "response": {"status": 200}}
            ]"#,
        );

        let (summary, sink) = run(&entries, &ReplayConfiguration::new());

        assert_eq!(summary, RunSummary { total: 2, valid: 1, invalid: 0 });
        assert_eq!(summary.skipped(), 1);
        assert_eq!(sink.skipped_entries(), vec![1]);
        assert!(sink
            .events
            .iter()
            .any(|event| matches!(event, Event::Skipped(1, Stage::Pending, _))));
    }

    #[test]
    fn unbuildable_response_skips_by_default() {
        let entries = entries(
            r#"[{"request": {"method": "GET", "path": "/bad"}, "response": {"status": 42}}]"#,
        );

        let (summary, sink) = run(&entries, &ReplayConfiguration::new());

        assert_eq!(summary, RunSummary { total: 1, valid: 0, invalid: 0 });
        assert!(sink
            .events
            .iter()
            .any(|event| matches!(event, Event::Skipped(1, Stage::RequestValidated, _))));
    }

    #[test]
    fn keep_request_errors_counts_entry_invalid() {
        let entries = entries(
            r#"[
                {"request": {"method": "GET", "path": "/bad"}, "response": {"status": 42}},
                {"request": {"method": "GET", "path": "/ok"}, "response": {"status": 42}}
            ]"#,
        );
        let mut configuration = ReplayConfiguration::new();
        configuration.set_skip_policy(SkipPolicy::KeepRequestErrors);

        let (summary, _) = run(&entries, &configuration);

        assert_eq!(summary, RunSummary { total: 2, valid: 0, invalid: 1 });
    }

    #[test]
    fn empty_transcript() {
        let (summary, sink) = run(&[], &ReplayConfiguration::new());

        assert_eq!(summary, RunSummary::new(0));
        assert_eq!(
            sink.events,
            vec![Event::Loaded(0), Event::Summary(RunSummary::new(0))]
        );
    }
}
