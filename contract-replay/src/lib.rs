pub mod contract;
mod error;
pub mod message;
mod replay_configuration;
pub mod replayer;
pub mod sink;
mod summary;
pub mod transcript;
mod util;
pub mod validator;

pub use contract::Contract;
pub use contract_replay_codegen::contract_replay_test;
pub use error::Error;
pub use message::error::Error as ReconstructError;
pub use replay_configuration::{OutputFormat, ReplayConfiguration, SkipPolicy};
pub use replayer::{replay_files, Replayer, Stage};
pub use sink::{DiagnosticSink, MemorySink, TracingSink};
pub use summary::RunSummary;
pub use transcript::TranscriptEntry;
pub use validator::{ContractValidator, Validator};
