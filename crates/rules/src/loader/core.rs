//! Core [`RuleLoader`] struct: filesystem-backed rule loading.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::schema::{RuleDocument, RuleEnvelope, RuleKind};

use super::compile::AnalyticsRules;
use super::error::{LoadResult, LoadStatus, Result, RuleError};

/// Filesystem-backed rule loader.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files, deserializes
/// them into [`RuleDocument`] instances via two-pass deserialization, and
/// keeps them keyed by rule ID.
pub struct RuleLoader {
    /// Root directory containing rule YAML files.
    rules_dir: PathBuf,
    /// All loaded rule documents keyed by `metadata.id`.
    documents: HashMap<String, RuleDocument>,
}

impl RuleLoader {
    pub fn new(rules_dir: PathBuf) -> Self {
        Self {
            rules_dir,
            documents: HashMap::new(),
        }
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Recursively scan the rules directory and load all YAML files,
    /// replacing anything loaded before.
    ///
    /// Dotfiles (filenames starting with `.`) and non-YAML files are skipped.
    /// Parse errors are reported per-file but do not abort the scan.
    pub fn load_all(&mut self) -> Result<Vec<LoadResult>> {
        self.documents.clear();
        let mut results = Vec::new();
        let root = self.rules_dir.clone();
        self.scan_dir_recursive(&root, &mut results)?;
        Ok(results)
    }

    /// Recursively scan a directory for YAML rule files.
    fn scan_dir_recursive(&mut self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        // Sorted so duplicate detection does not depend on directory order.
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        paths.sort();

        for path in paths {
            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            let status = match self.load_file(&path) {
                Ok(doc) => {
                    let rule_id = doc.metadata().id.clone();
                    if self.documents.contains_key(&rule_id) {
                        warn!(rule_id = %rule_id, path = %path.display(), "duplicate rule id");
                        LoadStatus::Failed {
                            error: format!("duplicate rule id '{}'", rule_id),
                        }
                    } else {
                        info!(rule_id = %rule_id, kind = %doc.kind(), path = %path.display(), "loaded rule");
                        self.documents.insert(rule_id.clone(), doc);
                        LoadStatus::Loaded { rule_id }
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Load and parse a single rule file.
    pub fn load_file(&self, path: &Path) -> Result<RuleDocument> {
        let content = fs::read_to_string(path)?;
        let envelope: RuleEnvelope = serde_yaml::from_str(&content)?;
        envelope.parse_full().map_err(RuleError::Validation)
    }

    /// Look up a loaded document by rule ID.
    pub fn get(&self, rule_id: &str) -> Option<&RuleDocument> {
        self.documents.get(rule_id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &RuleDocument> {
        self.documents.values()
    }

    /// Enabled documents of one kind, sorted by rule ID.
    pub fn enabled_of_kind(&self, kind: RuleKind) -> Vec<&RuleDocument> {
        let mut docs: Vec<&RuleDocument> = self
            .documents
            .values()
            .filter(|d| d.kind() == kind && d.metadata().enabled)
            .collect();
        docs.sort_by(|a, b| a.metadata().id.cmp(&b.metadata().id));
        docs
    }

    /// Compile the enabled documents into one [`AnalyticsRules`] bundle.
    pub fn compile(&self) -> Result<AnalyticsRules> {
        AnalyticsRules::from_loader(self)
    }
}
