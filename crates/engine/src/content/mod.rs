mod atomic_io;
mod bank;
mod compiler;
mod hashing;
mod pipeline;

pub use bank::{QuestionBank, QuestionDef};
pub use compiler::{compile_question_bank, QuestionCompileError, QuestionErrorCode, SourceLocation};
pub use hashing::SourceScanError;
pub use pipeline::{build_or_load_question_bank, ContentPipelineError};
