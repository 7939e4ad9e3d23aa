//! Axolotl config and job directory tests

use super::*;
use crate::datasets::{Dataset, JsonlConvos};
use crate::lora::{LoraError, LoraSettings};
use crate::models::BaseModel;
use crate::UnfatError;
use std::path::Path;
use tempfile::TempDir;

const CONVO: &str = r#"{"messages":[{"role":"user","content":"{a:1}"},{"role":"assistant","content":"{\"a\":1}"}]}"#;

fn dataset_in(dir: &Path, with_eval: bool) -> Dataset {
    let data = dir.join("src");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("train.jsonl"), format!("{CONVO}\n{CONVO}\n")).unwrap();
    std::fs::write(data.join("eval.jsonl"), format!("{CONVO}\n")).unwrap();
    let eval = if with_eval {
        vec![JsonlConvos::new(data.join("eval.jsonl"))]
    } else {
        vec![]
    };
    Dataset::new(vec![JsonlConvos::new(data.join("train.jsonl"))], eval)
}

fn json_fix_settings() -> LoraSettings {
    LoraSettings::new(32, 16, 0.01, 2, 4e-4).with_evals_per_epoch(10)
}

fn parse(config: &AxolotlConfig) -> AxolotlYaml {
    serde_yaml::from_str(&config.to_yaml().unwrap()).unwrap()
}

#[test]
fn test_llama_8b_preset() {
    let config = llama_3_1_8b_axolotl(Dataset::default(), json_fix_settings(), 10);
    assert_eq!(config.base_model, BaseModel::Llama3_1_8b);
    assert_eq!(config.effective_sequence_len(), 8192);
    assert_eq!(config.effective_batch_size(), 8);
}

#[test]
fn test_llama_70b_preset_uses_smaller_micro_batch() {
    let config = llama_3_1_70b_axolotl(Dataset::default(), json_fix_settings(), 10);
    assert_eq!(config.micro_batch_size, 1);
    assert_eq!(config.effective_batch_size(), 8);
}

#[test]
fn test_yaml_carries_lora_settings() {
    let config = llama_3_1_8b_axolotl(
        Dataset::new(vec![JsonlConvos::new("t.jsonl")], vec![JsonlConvos::new("e.jsonl")]),
        json_fix_settings(),
        10,
    );
    let yaml = parse(&config);

    assert_eq!(yaml.base_model, "meta-llama/Llama-3.1-8B-Instruct");
    assert_eq!(yaml.adapter, "lora");
    assert_eq!(yaml.lora_r, 32);
    assert_eq!(yaml.lora_alpha, 16);
    assert!((yaml.lora_dropout - 0.01).abs() < 1e-12);
    assert!(yaml.lora_target_linear);
    assert_eq!(yaml.num_epochs, 2);
    assert!((yaml.learning_rate - 4e-4).abs() < 1e-12);
    assert_eq!(yaml.warmup_steps, 10);
    assert_eq!(yaml.evals_per_epoch, Some(10));
    assert_eq!(yaml.datasets[0].path, "data/train.jsonl");
    assert_eq!(yaml.datasets[0].kind, "chat_template");
    assert_eq!(yaml.test_datasets[0].path, "data/eval.jsonl");
    assert_eq!(yaml.val_set_size, None);
}

#[test]
fn test_yaml_without_eval_disables_evaluation() {
    let config = llama_3_1_8b_axolotl(
        Dataset::new(vec![JsonlConvos::new("t.jsonl")], vec![]),
        json_fix_settings(),
        10,
    );
    let text = config.to_yaml().unwrap();
    assert!(!text.contains("test_datasets"));
    assert!(!text.contains("evals_per_epoch"));

    let yaml = parse(&config);
    assert_eq!(yaml.val_set_size, Some(0.0));
}

#[test]
fn test_yaml_never_contains_wandb_key() {
    let settings = json_fix_settings().with_wandb("json-fix", "super-secret");
    let config = llama_3_1_8b_axolotl(
        Dataset::new(vec![JsonlConvos::new("t.jsonl")], vec![]),
        settings,
        10,
    );
    let text = config.to_yaml().unwrap();
    assert!(text.contains("wandb_project: json-fix"));
    assert!(!text.contains("super-secret"));
}

#[test]
fn test_sequence_len_override() {
    let config = llama_3_1_8b_axolotl(Dataset::default(), json_fix_settings(), 0)
        .with_sequence_len(4096);
    assert_eq!(config.effective_sequence_len(), 4096);
}

#[test]
fn test_effective_batch_size_saturates() {
    let dir = TempDir::new().unwrap();
    let config = llama_3_1_8b_axolotl(dataset_in(dir.path(), false), json_fix_settings(), 10)
        .with_batching(65_536, 65_536);
    assert_eq!(config.effective_batch_size(), u32::MAX);
}

#[test]
fn test_save_writes_job_directory() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("output");
    let config = llama_3_1_8b_axolotl(dataset_in(dir.path(), true), json_fix_settings(), 10);

    let saved = config.save(&out).unwrap();

    assert_eq!(saved.config_path, out.join("config.yaml"));
    assert!(saved.config_path.is_file());
    assert_eq!(saved.train.conversations, 2);
    assert_eq!(saved.eval.as_ref().unwrap().conversations, 1);
    assert!(out.join("data/train.jsonl").is_file());
    assert!(out.join("data/eval.jsonl").is_file());
    assert!(saved.env_path.is_none());

    let text = std::fs::read_to_string(&saved.config_path).unwrap();
    assert!(text.starts_with("# Generated by unfat"));
}

#[test]
fn test_save_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("output");
    let config = llama_3_1_8b_axolotl(dataset_in(dir.path(), false), json_fix_settings(), 10);

    let first = config.save(&out).unwrap();
    let second = config.save(&out).unwrap();
    assert_eq!(first.train.sha256, second.train.sha256);
    assert!(second.eval.is_none());
}

#[test]
fn test_save_bad_eval_leaves_previous_job() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("output");
    let config = llama_3_1_8b_axolotl(dataset_in(dir.path(), true), json_fix_settings(), 10);
    config.save(&out).unwrap();
    let train_before = std::fs::read_to_string(out.join("data/train.jsonl")).unwrap();
    let eval_before = std::fs::read_to_string(out.join("data/eval.jsonl")).unwrap();

    // New train data, broken eval data
    std::fs::write(dir.path().join("src/train.jsonl"), format!("{CONVO}\n")).unwrap();
    std::fs::write(dir.path().join("src/eval.jsonl"), "{broken\n").unwrap();

    assert!(matches!(config.save(&out), Err(UnfatError::Dataset(_))));
    assert_eq!(
        std::fs::read_to_string(out.join("data/train.jsonl")).unwrap(),
        train_before
    );
    assert_eq!(
        std::fs::read_to_string(out.join("data/eval.jsonl")).unwrap(),
        eval_before
    );
}

#[test]
fn test_save_writes_env_file_for_wandb() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("output");
    let settings = json_fix_settings().with_wandb("json-fix", "wandb-key");
    let config = llama_3_1_8b_axolotl(dataset_in(dir.path(), true), settings, 10);

    let saved = config.save(&out).unwrap();
    let env_path = saved.env_path.unwrap();
    assert_eq!(
        std::fs::read_to_string(&env_path).unwrap(),
        "WANDB_API_KEY=wandb-key\n"
    );

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&env_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_save_rejects_invalid_settings() {
    let dir = TempDir::new().unwrap();
    let mut settings = json_fix_settings();
    settings.rank = 0;
    let config = llama_3_1_8b_axolotl(dataset_in(dir.path(), true), settings, 10);

    let err = config.save(dir.path().join("output")).unwrap_err();
    assert!(matches!(err, UnfatError::Lora(LoraError::InvalidRank(0))));
    assert!(!dir.path().join("output").exists());
}

#[test]
fn test_save_rejects_file_as_output_dir() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("output");
    std::fs::write(&blocker, "not a dir").unwrap();
    let config = llama_3_1_8b_axolotl(dataset_in(dir.path(), true), json_fix_settings(), 10);

    assert!(matches!(
        config.save(&blocker),
        Err(UnfatError::NotADirectory { .. })
    ));
}

#[test]
fn test_save_reports_missing_dataset() {
    let dir = TempDir::new().unwrap();
    let dataset = Dataset::new(vec![JsonlConvos::new(dir.path().join("missing.jsonl"))], vec![]);
    let config = llama_3_1_8b_axolotl(dataset, json_fix_settings(), 10);
    assert!(matches!(
        config.save(dir.path().join("output")),
        Err(UnfatError::Dataset(_))
    ));
}
