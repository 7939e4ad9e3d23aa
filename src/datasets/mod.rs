//! JSONL conversation datasets
//!
//! A dataset is a list of train sources and an optional list of eval
//! sources. Each source is a JSONL file where every line holds one
//! conversation:
//!
//! ```json
//! {"messages": [{"role": "user", "content": "hi"}, {"role": "assistant", "content": "hello"}]}
//! ```
//!
//! Sources of the same split are merged into one canonical JSONL file before
//! they are handed to a training target.

mod convo;
mod error;
mod source;
mod stats;


pub use convo::{ConvoIssue, Conversation, Message, Role};
pub use error::DatasetError;
pub use source::{Dataset, JsonlConvos, Split, SplitSummary};
pub use stats::{DatasetReport, SplitStats};
