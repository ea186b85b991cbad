//! JSON batch project: a list of replacements applied to a list of input files.

use bnk::SoundBank;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::editor::PackageEditor;
use crate::engine::{ReplaceSummary, replace_wem};
use crate::error::{PatchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Wem,
    Bnk,
}

impl ActionKind {
    fn label(self) -> &'static str {
        match self {
            ActionKind::Wem => "WEM",
            ActionKind::Bnk => "sound bank",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAction {
    pub kind: ActionKind,
    pub id: u32,
    pub source: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub inputs: Vec<PathBuf>,
    pub actions: Vec<ProjectAction>,
    /// Relative paths resolve against this directory, the project file's own by default.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Package,
    Bank,
}

fn input_kind(path: &Path) -> Option<InputKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pck" => Some(InputKind::Package),
        "bnk" => Some(InputKind::Bank),
        _ => None,
    }
}

/// Outcome for one input file.
#[derive(Debug, Clone, Serialize)]
pub struct InputReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub wem: ReplaceSummary,
    pub banks_replaced: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectReport {
    pub inputs: Vec<InputReport>,
    /// Actions that matched nothing in any input.
    pub unmatched: Vec<(ActionKind, u32)>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Project {
            name: name.into(),
            inputs: Vec::new(),
            actions: Vec::new(),
            base_dir: PathBuf::new(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut project: Project = serde_json::from_str(&text)?;
        project.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(project)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Every problem found, one per line in the error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("project name is empty".to_string());
        }
        if self.inputs.is_empty() {
            problems.push("no input files".to_string());
        }
        for input in &self.inputs {
            if input_kind(input).is_none() {
                problems.push(format!("input {} is neither .pck nor .bnk", input.display()));
            } else if !self.resolve(input).is_file() {
                problems.push(format!("input {} does not exist", input.display()));
            }
        }
        let mut targets = HashSet::new();
        for action in &self.actions {
            if !targets.insert((action.kind, action.id)) {
                problems.push(format!(
                    "{} {} is replaced more than once",
                    action.kind.label(),
                    action.id
                ));
            }
            if !self.resolve(&action.source).is_file() {
                problems.push(format!(
                    "source {} for {} {} does not exist",
                    action.source.display(),
                    action.kind.label(),
                    action.id
                ));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(PatchError::InvalidProject(problems.join("\n")))
        }
    }

    /// Validate, then apply every action to every input and write the results
    /// into `output_dir` under the input file names.
    pub fn run<P: AsRef<Path>>(&self, output_dir: P) -> Result<ProjectReport> {
        self.validate()?;
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        let mut sources = Vec::with_capacity(self.actions.len());
        for action in &self.actions {
            sources.push(fs::read(self.resolve(&action.source))?);
        }

        let mut matched = vec![false; self.actions.len()];
        let mut report = ProjectReport::default();
        for input in &self.inputs {
            let input_path = self.resolve(input);
            let file_name = input_path
                .file_name()
                .ok_or_else(|| PatchError::InvalidProject(format!("input {} has no file name", input.display())))?;
            let output = output_dir.join(file_name);
            let mut input_report = InputReport {
                input: input_path.clone(),
                output: output.clone(),
                wem: ReplaceSummary::default(),
                banks_replaced: 0,
            };

            match input_kind(&input_path) {
                Some(InputKind::Package) => {
                    let mut editor = PackageEditor::open(&input_path)?;
                    for (i, (action, data)) in self.actions.iter().zip(&sources).enumerate() {
                        let hit = match action.kind {
                            ActionKind::Wem => {
                                let summary = editor.replace_wem(action.id, data)?;
                                input_report.wem.merge(summary);
                                !summary.is_empty()
                            }
                            ActionKind::Bnk => {
                                let replaced = editor.replace_bnk(action.id, data);
                                input_report.banks_replaced += replaced;
                                replaced > 0
                            }
                        };
                        matched[i] |= hit;
                    }
                    editor.save(&output)?;
                }
                Some(InputKind::Bank) => {
                    let mut bank = SoundBank::open(&input_path)?;
                    let mut replacement = None;
                    for (i, (action, data)) in self.actions.iter().zip(&sources).enumerate() {
                        if action.kind == ActionKind::Bnk && action.id == bank.id {
                            matched[i] = true;
                            replacement = Some(data);
                        }
                    }
                    if let Some(data) = replacement {
                        bank = SoundBank::from_bytes(data)?;
                        input_report.banks_replaced += 1;
                    }

                    // WEM actions land on the replacement bank when there is one.
                    let mut media_changed = false;
                    for (i, (action, data)) in self.actions.iter().zip(&sources).enumerate() {
                        if action.kind != ActionKind::Wem {
                            continue;
                        }
                        let summary = replace_wem(&mut bank, action.id, data)?;
                        input_report.wem.merge(summary);
                        media_changed |= !summary.is_empty();
                        matched[i] |= !summary.is_empty();
                    }
                    match replacement {
                        Some(data) if !media_changed => fs::write(&output, data)?,
                        _ => bank.save(&output)?,
                    }
                }
                None => {
                    return Err(PatchError::InvalidProject(format!(
                        "input {} is neither .pck nor .bnk",
                        input.display()
                    )));
                }
            }

            info!(
                "{} -> {}: {} banks with new media, {} references, {} banks replaced",
                input_report.input.display(),
                input_report.output.display(),
                input_report.wem.banks_modified,
                input_report.wem.references_patched,
                input_report.banks_replaced
            );
            report.inputs.push(input_report);
        }

        for (action, hit) in self.actions.iter().zip(&matched) {
            if !hit {
                warn!("{} {} was not found in any input", action.kind.label(), action.id);
                report.unmatched.push((action.kind, action.id));
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape() {
        let json = r#"{
            "name": "music swap",
            "inputs": ["Music.pck"],
            "actions": [{ "kind": "wem", "id": 12, "source": "new.wem" }]
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.actions[0].kind, ActionKind::Wem);
        assert_eq!(project.inputs, vec![PathBuf::from("Music.pck")]);
    }

    #[test]
    fn validation_lists_every_problem() {
        let mut project = Project::new(" ");
        project.base_dir = PathBuf::from("/nonexistent");
        project.inputs.push(PathBuf::from("sounds.zip"));
        for _ in 0..2 {
            project.actions.push(ProjectAction {
                kind: ActionKind::Wem,
                id: 5,
                source: PathBuf::from("a.wem"),
            });
        }
        let Err(PatchError::InvalidProject(message)) = project.validate() else {
            panic!("expected an invalid project");
        };
        assert!(message.contains("name is empty"));
        assert!(message.contains("neither .pck nor .bnk"));
        assert!(message.contains("more than once"));
        assert!(message.contains("a.wem"));
    }
}
