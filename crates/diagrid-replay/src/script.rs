//! Gesture scripts: a starting tree plus a list of steps.

use diagrid_core::{
    CanvasEvent, ChannelEvent, ConfigError, Diagram, DispatchOutcome, Editor, EditorConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Dispatch { event: CanvasEvent },
    Publish { event: ChannelEvent },
    Flush,
    Undo,
    Redo,
    Cancel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub items: Vec<Diagram>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Counts of what the steps did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub committed: usize,
    pub skipped: usize,
}

fn read(path: &Path) -> Result<String, ReplayError> {
    fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_script(path: &Path) -> Result<Script, ReplayError> {
    Ok(serde_json::from_str(&read(path)?)?)
}

pub fn load_config(path: &Path) -> Result<EditorConfig, ReplayError> {
    Ok(EditorConfig::from_json(&read(path)?)?)
}

/// Play every step against `editor`.
pub fn run(editor: &mut Editor, script: Script) -> Summary {
    editor.load(script.items);
    let mut summary = Summary::default();
    for (n, step) in script.steps.into_iter().enumerate() {
        let changed = match step {
            Step::Dispatch { event } => match editor.dispatch(event) {
                DispatchOutcome::Committed => {
                    summary.committed += 1;
                    true
                }
                DispatchOutcome::Skipped => false,
                DispatchOutcome::Applied | DispatchOutcome::Cancelled => true,
            },
            Step::Publish { event } => {
                editor.publish(event);
                true
            }
            Step::Flush => editor.flush_events() > 0,
            Step::Undo => editor.undo(),
            Step::Redo => editor.redo(),
            Step::Cancel => editor.cancel() == DispatchOutcome::Cancelled,
        };
        if !changed {
            log::info!("Step {n} had no effect");
            summary.skipped += 1;
        }
    }
    summary
}
