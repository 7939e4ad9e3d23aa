//! Writing the Axolotl job directory

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::config::AxolotlConfig;
use super::yaml::AxolotlYaml;
use crate::datasets::{DatasetError, Split, SplitSummary};
use crate::error::{Result, UnfatError};

const CONFIG_FILE: &str = "config.yaml";
const DATA_DIR: &str = "data";
const ENV_FILE: &str = ".env";

const CONFIG_HEADER: &str = "# Generated by unfat. Run from this directory:\n#   axolotl train config.yaml\n";

/// Files produced by [`AxolotlConfig::save`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedJob {
    pub dir: PathBuf,
    pub config_path: PathBuf,
    pub train: SplitSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval: Option<SplitSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_path: Option<PathBuf>,
}

impl AxolotlConfig {
    /// Render `config.yaml` for datasets stored under `data/`.
    pub fn to_yaml(&self) -> Result<String> {
        let train = format!("{DATA_DIR}/{}", Split::Train.file_name());
        let eval = format!("{DATA_DIR}/{}", Split::Eval.file_name());
        let eval = self.dataset.has_eval().then_some(eval.as_str());
        let body = serde_yaml::to_string(&AxolotlYaml::from_config(self, &train, eval))?;
        Ok(format!("{CONFIG_HEADER}{body}"))
    }

    /// Validate, then write the job directory.
    ///
    /// Every source is read before anything is written, so a bad line leaves
    /// an existing job directory untouched. Existing files with the same
    /// names are overwritten; other files in the directory are left alone.
    pub fn save(&self, output_dir: impl AsRef<Path>) -> Result<SavedJob> {
        let dir = output_dir.as_ref();
        self.settings.validate()?;
        self.dataset.check_sources()?;
        let yaml = self.to_yaml()?;

        if dir.exists() && !dir.is_dir() {
            return Err(UnfatError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        fs::create_dir_all(dir)
            .map_err(|e| UnfatError::io(format!("creating {}", dir.display()), e))?;

        let data_dir = dir.join(DATA_DIR);
        let train = self
            .dataset
            .write_split(Split::Train, &data_dir.join(Split::Train.file_name()))?
            .ok_or(DatasetError::NoTrainingData)?;
        let eval = self
            .dataset
            .write_split(Split::Eval, &data_dir.join(Split::Eval.file_name()))?;

        let config_path = dir.join(CONFIG_FILE);
        fs::write(&config_path, yaml)
            .map_err(|e| UnfatError::io(format!("writing {}", config_path.display()), e))?;

        let env_path = match &self.settings.wandb_api_key {
            Some(key) => Some(write_env_file(dir, key)?),
            None => None,
        };

        Ok(SavedJob {
            dir: dir.to_path_buf(),
            config_path,
            train,
            eval,
            env_path,
        })
    }
}

fn write_env_file(dir: &Path, wandb_api_key: &str) -> Result<PathBuf> {
    let path = dir.join(ENV_FILE);
    fs::write(&path, format!("WANDB_API_KEY={wandb_api_key}\n"))
        .map_err(|e| UnfatError::io(format!("writing {}", path.display()), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .map_err(|e| UnfatError::io(format!("restricting {}", path.display()), e))?;
    }

    Ok(path)
}
