#[cfg(test)]
mod tests {
    use contract_replay::{
        contract_replay_test, replay_files, sink::Event, validator::ErrorKind, Error, MemorySink,
        ReplayConfiguration, RunSummary, SkipPolicy,
    };

    fn fixture(name: &str) -> String {
        format!("{}/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn replay(transcript: &str, configuration: &ReplayConfiguration) -> (RunSummary, MemorySink) {
        let mut sink = MemorySink::new();
        let summary = replay_files(
            fixture(transcript),
            fixture("petstore.yaml"),
            configuration,
            &mut sink,
        )
        .unwrap();
        (summary, sink)
    }

    fn keep_request_errors(configuration: &mut ReplayConfiguration) {
        configuration.set_skip_policy(SkipPolicy::KeepRequestErrors);
    }

    #[contract_replay_test("fixtures/valid_list.json", "fixtures/petstore.yaml")]
    fn empty_pet_list_is_valid() {}

    #[contract_replay_test("fixtures/undefined_status.json", "fixtures/petstore.yaml")]
    fn undefined_status_is_invalid(summary: RunSummary) {
        assert_eq!(
            summary,
            RunSummary {
                total: 1,
                valid: 0,
                invalid: 1
            }
        );
    }

    #[contract_replay_test("fixtures/mixed.json", "fixtures/petstore.yaml")]
    fn mixed_transcript_is_tallied(summary: RunSummary) {
        assert_eq!(summary.total, 6);
        assert_eq!(summary.valid, 3);
        assert_eq!(summary.invalid, 2);
        assert_eq!(summary.skipped(), 1);
    }

    #[contract_replay_test(
        "fixtures/bad_response.json",
        "fixtures/petstore.yaml",
        keep_request_errors
    )]
    fn configuration_function_is_applied(summary: RunSummary) {
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.skipped(), 0);
    }

    #[contract_replay_test("fixtures/empty.json", "fixtures/petstore.yaml")]
    fn empty_transcript_is_clean() {}

    #[test]
    fn undefined_status_error_names_the_code() {
        let (_, sink) = replay("undefined_status.json", &ReplayConfiguration::new());

        let errors = sink.conformance_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::UndefinedStatus);
        assert!(errors[0].to_string().contains("404"));
    }

    #[test]
    fn invalid_path_entry_is_skipped() {
        let (_, sink) = replay("mixed.json", &ReplayConfiguration::new());

        assert_eq!(sink.skipped_entries(), vec![2]);
    }

    #[test]
    fn each_invalid_entry_reports_its_rule() {
        let (_, sink) = replay("mixed.json", &ReplayConfiguration::new());

        let kinds: Vec<ErrorKind> = sink
            .conformance_errors()
            .iter()
            .map(|error| error.kind)
            .collect();
        assert!(kinds.contains(&ErrorKind::InvalidParameter));
        assert!(kinds.contains(&ErrorKind::OperationNotFound));
        assert!(!kinds.contains(&ErrorKind::UndefinedStatus));
    }

    #[test]
    fn skipped_response_is_left_out_by_default() {
        let (summary, sink) = replay("bad_response.json", &ReplayConfiguration::new());

        assert_eq!(
            summary,
            RunSummary {
                total: 2,
                valid: 1,
                invalid: 0
            }
        );
        assert!(sink
            .events
            .iter()
            .any(|event| matches!(event, Event::RequestInvalid(1, _))));
        assert_eq!(sink.skipped_entries(), vec![1]);
    }

    #[test]
    fn counts_never_exceed_total() {
        for transcript in &[
            "valid_list.json",
            "undefined_status.json",
            "mixed.json",
            "bad_response.json",
            "empty.json",
        ] {
            let (summary, _) = replay(transcript, &ReplayConfiguration::new());
            assert!(summary.valid + summary.invalid <= summary.total);
        }
    }

    #[test]
    fn bare_object_transcript_is_fatal() {
        let mut sink = MemorySink::new();

        let result = replay_files(
            fixture("bare_object.json"),
            fixture("petstore.yaml"),
            &ReplayConfiguration::new(),
            &mut sink,
        );

        assert!(matches!(result, Err(Error::DecodeTranscript(_))));
        assert!(!sink
            .events
            .iter()
            .any(|event| matches!(event, Event::Summary(_))));
    }

    #[test]
    fn missing_contract_is_fatal() {
        let mut sink = MemorySink::new();

        let result = replay_files(
            fixture("valid_list.json"),
            fixture("missing.yaml"),
            &ReplayConfiguration::new(),
            &mut sink,
        );

        assert!(matches!(result, Err(Error::ReadContract(_, _))));
        assert!(result
            .unwrap_err()
            .to_string()
            .starts_with("Failed to read OpenAPI spec from"));
    }

    #[test]
    fn transcript_is_not_read_when_contract_fails() {
        let mut sink = MemorySink::new();

        let result = replay_files(
            fixture("missing.json"),
            fixture("valid_list.json"),
            &ReplayConfiguration::new(),
            &mut sink,
        );

        assert!(matches!(result, Err(Error::ParseContract(_))));
    }
}
