//! Rule-set editor
//!
//! A draft holds rules as the user types them (params as raw JSON text).
//! The catalog of available rules, fetched from the backend, drives type
//! suggestions and fills in descriptions and default params.

use crate::error::{ClientError, FieldErrors, Result};
use serde::Deserialize;
use serde_json::Value;
use smartask_common::models::{Rule, RuleKind, RuleParams, RuleSet};
use std::collections::{BTreeMap, HashSet};

const EMPTY_PARAMS_TEXT: &str = "{\n}";

/// One rule as edited
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RuleDraftFile")]
pub struct RuleDraft {
    pub rule_type: String,
    /// `None` means the user has not picked a kind yet
    pub kind: Option<RuleKind>,
    pub description: String,
    pub params_text: String,
}

impl Default for RuleDraft {
    fn default() -> Self {
        Self {
            rule_type: String::new(),
            kind: Some(RuleKind::Soft),
            description: String::new(),
            params_text: EMPTY_PARAMS_TEXT.to_string(),
        }
    }
}

impl RuleDraft {
    pub fn with_type(rule_type: &str) -> Self {
        Self {
            rule_type: rule_type.to_string(),
            ..Default::default()
        }
    }

    fn from_rule(rule: &Rule) -> Self {
        Self {
            rule_type: rule.rule_type.clone(),
            kind: Some(rule.kind),
            description: rule.description.clone().unwrap_or_default(),
            params_text: rule.params.to_pretty_json(),
        }
    }
}

/// On-disk form of a rule draft; `params` may be an object or JSON text
#[derive(Deserialize)]
struct RuleDraftFile {
    #[serde(rename = "type", default)]
    rule_type: String,
    #[serde(default)]
    kind: Option<RuleKind>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    params: Value,
}

impl From<RuleDraftFile> for RuleDraft {
    fn from(file: RuleDraftFile) -> Self {
        let params_text = match file.params {
            Value::Null => String::new(),
            Value::String(text) => text,
            other => other.to_string(),
        };
        Self {
            rule_type: file.rule_type,
            kind: file.kind,
            description: file.description,
            params_text,
        }
    }
}

/// A rule set being created or edited
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleSetDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<RuleDraft>,
}

impl Default for RuleSetDraft {
    /// New drafts start with one blank rule
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            rules: vec![RuleDraft::default()],
        }
    }
}

impl RuleSetDraft {
    /// Draft for editing an existing rule set
    pub fn from_rule_set(set: &RuleSet) -> Self {
        Self {
            name: set.name.clone(),
            description: set.description.clone().unwrap_or_default(),
            rules: set.rules.iter().map(RuleDraft::from_rule).collect(),
        }
    }

    /// Non-blank rule types, in rule order
    pub fn selected_types(&self) -> Vec<&str> {
        self.rules
            .iter()
            .map(|rule| rule.rule_type.as_str())
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn has_duplicate_types(&self) -> bool {
        let mut seen = HashSet::new();
        self.selected_types().into_iter().any(|t| !seen.insert(t))
    }

    /// Append a rule typed with the first catalog type not yet used
    ///
    /// Returns the new rule's index.
    pub fn add_rule(&mut self, catalog: &RuleCatalog) -> usize {
        let next_type = catalog
            .remaining_types(self)
            .first()
            .map(|t| t.to_string())
            .unwrap_or_default();

        let mut rule = RuleDraft::with_type(&next_type);
        catalog.autofill(&mut rule);
        self.rules.push(rule);
        self.rules.len() - 1
    }

    /// Field errors; empty when the draft can be saved
    ///
    /// `existing_names` are the names of other rule sets. When editing, leave
    /// the edited set's own name out.
    pub fn validate(&self, existing_names: &[String]) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let name = self.name.trim();

        if name.is_empty() {
            errors.insert("name".to_string(), "Name is required.".to_string());
        } else if existing_names.iter().any(|existing| existing == name) {
            errors.insert(
                "name".to_string(),
                "A ruleset with this name already exists.".to_string(),
            );
        }

        if self.has_duplicate_types() {
            errors.insert("rules".to_string(), "Rule types must be unique.".to_string());
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if rule.rule_type.trim().is_empty() {
                errors.insert(format!("rule_{}_type", i), "Type is required.".to_string());
            }
            if rule.kind.is_none() {
                errors.insert(format!("rule_{}_kind", i), "Kind is required.".to_string());
            }
            if rule.description.trim().is_empty() {
                errors.insert(
                    format!("rule_{}_description", i),
                    "Description is required.".to_string(),
                );
            }
            if let Err(e) = RuleParams::parse(&rule.params_text) {
                errors.insert(format!("rule_{}_params", i), e.to_string());
            }
        }

        errors
    }

    /// Validate and produce the payload for create/update
    pub fn build(&self, existing_names: &[String]) -> Result<RuleSet> {
        let errors = self.validate(existing_names);
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }

        let rules = self
            .rules
            .iter()
            .map(|draft| -> Result<Rule> {
                Ok(Rule {
                    id: None,
                    rule_type: draft.rule_type.trim().to_string(),
                    kind: draft.kind.unwrap_or_default(),
                    scope: None,
                    description: Some(draft.description.trim().to_string()),
                    params: RuleParams::parse(&draft.params_text)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let description = self.description.trim();
        Ok(RuleSet {
            id: None,
            name: self.name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            rules,
            created_at: None,
            updated_at: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CatalogEntry {
    description: String,
    params: RuleParams,
}

/// Rules the backend knows how to evaluate, indexed by type
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    types: Vec<String>,
    by_type: BTreeMap<String, CatalogEntry>,
}

impl RuleCatalog {
    /// Build from `GET /rulesets/rules/available`; blank and repeated
    /// types are skipped
    pub fn from_rules(rules: &[Rule]) -> Self {
        let mut catalog = Self::default();
        for rule in rules {
            let rule_type = rule.rule_type.trim();
            if rule_type.is_empty() || catalog.by_type.contains_key(rule_type) {
                continue;
            }
            catalog.types.push(rule_type.to_string());
            catalog.by_type.insert(
                rule_type.to_string(),
                CatalogEntry {
                    description: rule.description.clone().unwrap_or_default(),
                    params: rule.params.clone(),
                },
            );
        }
        catalog
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains(&self, rule_type: &str) -> bool {
        self.by_type.contains_key(rule_type)
    }

    /// Catalog types not yet used by `draft`, in catalog order
    pub fn remaining_types(&self, draft: &RuleSetDraft) -> Vec<&str> {
        let selected = draft.selected_types();
        self.types
            .iter()
            .map(String::as_str)
            .filter(|t| !selected.contains(t))
            .collect()
    }

    /// Fill blank description and empty params from the catalog entry
    ///
    /// Fields the user already filled in are left alone. Returns false when
    /// the rule's type is not in the catalog.
    pub fn autofill(&self, rule: &mut RuleDraft) -> bool {
        let Some(entry) = self.by_type.get(rule.rule_type.trim()) else {
            return false;
        };
        if rule.description.trim().is_empty() {
            rule.description = entry.description.clone();
        }
        if RuleParams::is_empty_text(&rule.params_text) {
            rule.params_text = entry.params.to_pretty_json();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> RuleCatalog {
        let rules: Vec<Rule> = serde_json::from_value(json!([
            {"type": "maxConsecutiveDays", "kind": "hard", "description": "No more than N days in a row", "params": {"max": 5}},
            {"type": "minRestHours", "kind": "soft", "description": "Rest between shifts", "params": {}},
            {"type": "maxConsecutiveDays", "description": "duplicate"},
            {"type": " "},
        ]))
        .unwrap();
        RuleCatalog::from_rules(&rules)
    }

    fn complete_draft() -> RuleSetDraft {
        RuleSetDraft {
            name: "Summer".to_string(),
            description: String::new(),
            rules: vec![RuleDraft {
                rule_type: "minRestHours".to_string(),
                kind: Some(RuleKind::Hard),
                description: "Rest".to_string(),
                params_text: "{\"hours\": 11}".to_string(),
            }],
        }
    }

    #[test]
    fn test_catalog_skips_blank_and_repeated_types() {
        let catalog = catalog();
        assert_eq!(catalog.types(), &["maxConsecutiveDays", "minRestHours"]);
        assert!(catalog.contains("minRestHours"));
    }

    #[test]
    fn test_add_rule_picks_first_remaining_and_autofills() {
        let catalog = catalog();
        let mut draft = RuleSetDraft::default();
        draft.rules[0].rule_type = "maxConsecutiveDays".to_string();

        assert_eq!(catalog.remaining_types(&draft), vec!["minRestHours"]);

        let index = draft.add_rule(&catalog);
        assert_eq!(index, 1);
        assert_eq!(draft.rules[1].rule_type, "minRestHours");
        assert_eq!(draft.rules[1].description, "Rest between shifts");
        assert!(catalog.remaining_types(&draft).is_empty());

        // Nothing left: blank type
        let index = draft.add_rule(&catalog);
        assert_eq!(draft.rules[index].rule_type, "");
    }

    #[test]
    fn test_autofill_keeps_user_input() {
        let catalog = catalog();
        let mut rule = RuleDraft {
            rule_type: "maxConsecutiveDays".to_string(),
            description: "my words".to_string(),
            ..Default::default()
        };
        assert!(catalog.autofill(&mut rule));
        assert_eq!(rule.description, "my words");
        assert!(rule.params_text.contains("\"max\": 5"));

        let mut custom = RuleDraft {
            rule_type: "maxConsecutiveDays".to_string(),
            params_text: "{\"max\": 3}".to_string(),
            ..Default::default()
        };
        catalog.autofill(&mut custom);
        assert_eq!(custom.params_text, "{\"max\": 3}");
        assert_eq!(custom.description, "No more than N days in a row");

        let mut unknown = RuleDraft::with_type("custom");
        assert!(!catalog.autofill(&mut unknown));
    }

    #[test]
    fn test_validation_keys() {
        let draft = RuleSetDraft {
            name: "  ".to_string(),
            description: String::new(),
            rules: vec![
                RuleDraft {
                    rule_type: "a".to_string(),
                    kind: None,
                    description: String::new(),
                    params_text: "{broken".to_string(),
                },
                RuleDraft {
                    rule_type: "a".to_string(),
                    description: "ok".to_string(),
                    ..Default::default()
                },
                RuleDraft::default(),
            ],
        };
        let errors = draft.validate(&[]);

        assert_eq!(errors["name"], "Name is required.");
        assert_eq!(errors["rules"], "Rule types must be unique.");
        assert_eq!(errors["rule_0_kind"], "Kind is required.");
        assert!(errors.contains_key("rule_0_description"));
        assert!(errors.contains_key("rule_0_params"));
        assert!(!errors.contains_key("rule_1_type"));
        assert_eq!(errors["rule_2_type"], "Type is required.");
    }

    #[test]
    fn test_existing_name_rejected() {
        let errors = complete_draft().validate(&["Summer".to_string()]);
        assert_eq!(errors["name"], "A ruleset with this name already exists.");
    }

    #[test]
    fn test_build_payload() {
        let set = complete_draft().build(&["Winter".to_string()]).unwrap();
        assert_eq!(set.name, "Summer");
        assert!(set.description.is_none());
        assert_eq!(set.rules[0].kind, RuleKind::Hard);
        assert_eq!(set.rules[0].params.0["hours"], 11);

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["rules"][0]["type"], "minRestHours");
        assert_eq!(json["rules"][0]["kind"], "hard");
    }

    #[test]
    fn test_blank_params_become_empty_object() {
        let mut draft = complete_draft();
        draft.rules[0].params_text = "   ".to_string();
        let set = draft.build(&[]).unwrap();
        assert!(set.rules[0].params.is_empty());
    }

    #[test]
    fn test_draft_file_accepts_object_or_text_params() {
        let draft: RuleSetDraft = serde_json::from_value(json!({
            "name": "From file",
            "rules": [
                {"type": "a", "kind": "soft", "description": "A", "params": {"x": 1}},
                {"type": "b", "kind": "hard", "description": "B", "params": "{\"y\": 2}"},
                {"type": "c", "description": "C"}
            ]
        }))
        .unwrap();

        assert_eq!(draft.rules[0].params_text, r#"{"x":1}"#);
        assert_eq!(draft.rules[1].params_text, r#"{"y": 2}"#);
        assert!(draft.rules[2].kind.is_none());
        assert!(draft.build(&[]).is_err());
    }

    #[test]
    fn test_edit_existing_rule_set_round_trip() {
        let set = complete_draft().build(&[]).unwrap();
        let draft = RuleSetDraft::from_rule_set(&set);
        assert_eq!(draft.rules[0].rule_type, "minRestHours");
        assert!(draft.validate(&[]).is_empty());
    }
}
