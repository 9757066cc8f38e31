/// What happens to an entry whose response cannot be rebuilt.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SkipPolicy {
    /// The entry is left out of the tally altogether.
    SkipEntirely,
    /// The entry counts as invalid when its request already failed validation.
    KeepRequestErrors,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        SkipPolicy::SkipEntirely
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplayConfiguration {
    fail_if_invalid: bool,
    skip_policy: SkipPolicy,
    output_format: OutputFormat,
}

impl ReplayConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_if_invalid(&mut self, value: bool) {
        self.fail_if_invalid = value;
    }

    pub fn fail_if_invalid(&self) -> bool {
        self.fail_if_invalid
    }

    pub fn set_skip_policy(&mut self, skip_policy: SkipPolicy) {
        self.skip_policy = skip_policy;
    }

    pub fn skip_policy(&self) -> SkipPolicy {
        self.skip_policy
    }

    pub fn set_output_format(&mut self, output_format: OutputFormat) {
        self.output_format = output_format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }
}
