//! Dataset sources and split merging

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::convo::Conversation;
use super::error::DatasetError;

/// Local JSONL file of conversations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonlConvos {
    path: PathBuf,
}

impl JsonlConvos {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a relative path against `base`. Absolute paths are kept.
    #[must_use]
    pub fn resolve(&self, base: &Path) -> Self {
        if self.path.is_absolute() {
            self.clone()
        } else {
            Self::new(base.join(&self.path))
        }
    }

    /// Parse and validate every conversation in the file.
    pub fn read(&self) -> Result<Vec<Conversation>, DatasetError> {
        let mut conversations = Vec::new();
        self.for_each(|convo| {
            conversations.push(convo);
            Ok(())
        })?;
        Ok(conversations)
    }

    /// Stream validated conversations to `f`, one per non-blank line.
    pub(crate) fn for_each<F>(&self, mut f: F) -> Result<usize, DatasetError>
    where
        F: FnMut(Conversation) -> Result<(), DatasetError>,
    {
        let file = File::open(&self.path).map_err(|e| DatasetError::io(&self.path, e))?;
        let reader = BufReader::new(file);
        let mut seen = 0;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| DatasetError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let convo: Conversation =
                serde_json::from_str(&line).map_err(|e| DatasetError::Parse {
                    path: self.path.clone(),
                    line: line_no,
                    message: e.to_string(),
                })?;
            convo
                .validate()
                .map_err(|issue| DatasetError::InvalidConversation {
                    path: self.path.clone(),
                    line: line_no,
                    issue,
                })?;
            f(convo)?;
            seen += 1;
        }

        if seen == 0 {
            return Err(DatasetError::EmptyFile {
                path: self.path.clone(),
            });
        }
        Ok(seen)
    }
}

/// Which half of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Eval,
}

impl Split {
    /// File name used for the merged split
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Train => "train.jsonl",
            Self::Eval => "eval.jsonl",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Eval => write!(f, "eval"),
        }
    }
}

/// Result of merging one split into a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    /// Written file
    pub path: PathBuf,
    /// Conversations written
    pub conversations: usize,
    /// Messages across all conversations
    pub messages: usize,
    /// Hex SHA-256 of the written bytes
    pub sha256: String,
}

/// Train and eval sources for one job
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub train: Vec<JsonlConvos>,
    #[serde(default)]
    pub eval: Vec<JsonlConvos>,
}

impl Dataset {
    pub fn new(train: Vec<JsonlConvos>, eval: Vec<JsonlConvos>) -> Self {
        Self { train, eval }
    }

    /// Sources of a split
    pub fn sources(&self, split: Split) -> &[JsonlConvos] {
        match split {
            Split::Train => &self.train,
            Split::Eval => &self.eval,
        }
    }

    pub fn has_eval(&self) -> bool {
        !self.eval.is_empty()
    }

    /// Resolve every relative source path against `base`.
    #[must_use]
    pub fn resolve(&self, base: &Path) -> Self {
        Self {
            train: self.train.iter().map(|s| s.resolve(base)).collect(),
            eval: self.eval.iter().map(|s| s.resolve(base)).collect(),
        }
    }

    /// Structural check without touching the filesystem.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.train.is_empty() {
            return Err(DatasetError::NoTrainingData);
        }
        Ok(())
    }

    /// Check that every source file exists.
    pub fn check_files(&self) -> Result<(), DatasetError> {
        self.validate()?;
        for source in self.train.iter().chain(&self.eval) {
            if !source.path().is_file() {
                return Err(DatasetError::NotFound {
                    path: source.path().to_path_buf(),
                });
            }
        }
        Ok(())
    }

    /// Read every source to the end without writing anything.
    pub fn check_sources(&self) -> Result<(), DatasetError> {
        self.check_files()?;
        for source in self.train.iter().chain(&self.eval) {
            source.for_each(|_| Ok(()))?;
        }
        Ok(())
    }

    /// Concatenate every source of `split` into `dest` as canonical JSONL.
    ///
    /// Output goes to a sibling `.partial` file that replaces `dest` only
    /// once every source has been read. Returns `None` for an eval split
    /// with no sources.
    pub fn write_split(
        &self,
        split: Split,
        dest: &Path,
    ) -> Result<Option<SplitSummary>, DatasetError> {
        let sources = self.sources(split);
        if sources.is_empty() {
            return match split {
                Split::Train => Err(DatasetError::NoTrainingData),
                Split::Eval => Ok(None),
            };
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
        }
        let partial = partial_path(dest);
        let summary = match merge_sources(sources, dest, &partial) {
            Ok(summary) => summary,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
        };
        fs::rename(&partial, dest).map_err(|e| DatasetError::io(dest, e))?;
        Ok(Some(summary))
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dest.with_file_name(name)
}

/// Write `sources` to `partial`, reporting them as `dest`
fn merge_sources(
    sources: &[JsonlConvos],
    dest: &Path,
    partial: &Path,
) -> Result<SplitSummary, DatasetError> {
    let file = File::create(partial).map_err(|e| DatasetError::io(partial, e))?;
    let mut writer = BufWriter::new(file);
    let mut hasher = Sha256::new();
    let mut conversations = 0;
    let mut messages = 0;

    for source in sources {
        source.for_each(|convo| {
            let mut line = serde_json::to_string(&convo).map_err(|e| DatasetError::Parse {
                path: source.path().to_path_buf(),
                line: conversations + 1,
                message: e.to_string(),
            })?;
            line.push('\n');
            writer
                .write_all(line.as_bytes())
                .map_err(|e| DatasetError::io(partial, e))?;
            hasher.update(line.as_bytes());
            conversations += 1;
            messages += convo.messages.len();
            Ok(())
        })?;
    }
    writer.flush().map_err(|e| DatasetError::io(partial, e))?;

    Ok(SplitSummary {
        path: dest.to_path_buf(),
        conversations,
        messages,
        sha256: hex::encode(hasher.finalize()),
    })
}

