//! Dataset statistics

use serde::Serialize;

use super::convo::{Conversation, Role};
use super::error::DatasetError;
use super::source::{Dataset, Split};

/// Counts for one split
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SplitStats {
    pub files: usize,
    pub conversations: usize,
    pub system_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    /// Longest conversation in messages
    pub max_turns: usize,
}

impl SplitStats {
    fn record(&mut self, convo: &Conversation) {
        self.conversations += 1;
        self.system_messages += convo.count(Role::System);
        self.user_messages += convo.count(Role::User);
        self.assistant_messages += convo.count(Role::Assistant);
        self.max_turns = self.max_turns.max(convo.messages.len());
    }

    pub fn messages(&self) -> usize {
        self.system_messages + self.user_messages + self.assistant_messages
    }

    /// Mean messages per conversation
    pub fn mean_turns(&self) -> f64 {
        if self.conversations == 0 {
            0.0
        } else {
            self.messages() as f64 / self.conversations as f64
        }
    }
}

/// Statistics for a whole dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    pub train: SplitStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval: Option<SplitStats>,
}

impl DatasetReport {
    /// Read every source and collect counts. Fails on the first bad line.
    pub fn collect(dataset: &Dataset) -> Result<Self, DatasetError> {
        dataset.validate()?;
        let train = split_stats(dataset, Split::Train)?;
        let eval = if dataset.has_eval() {
            Some(split_stats(dataset, Split::Eval)?)
        } else {
            None
        };
        Ok(Self { train, eval })
    }

    /// Eval conversations as a fraction of all conversations
    pub fn eval_fraction(&self) -> f64 {
        let eval = self.eval.as_ref().map_or(0, |s| s.conversations);
        let total = self.train.conversations + eval;
        if total == 0 {
            0.0
        } else {
            eval as f64 / total as f64
        }
    }
}

fn split_stats(dataset: &Dataset, split: Split) -> Result<SplitStats, DatasetError> {
    let mut stats = SplitStats::default();
    for source in dataset.sources(split) {
        source.for_each(|convo| {
            stats.record(&convo);
            Ok(())
        })?;
        stats.files += 1;
    }
    Ok(stats)
}
