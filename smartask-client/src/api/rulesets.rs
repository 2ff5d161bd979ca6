//! Rule-set catalog and CRUD endpoints
//!
//! Rule sets are addressed by name.

use super::BackendClient;
use crate::error::Result;
use smartask_common::models::{Rule, RuleSet};

impl BackendClient {
    pub async fn list_rulesets(&self) -> Result<Vec<RuleSet>> {
        let url = self.endpoint(&["rulesets"]);
        self.send_json(self.http().get(url), "list rule sets").await
    }

    pub async fn ruleset(&self, name: &str) -> Result<RuleSet> {
        let url = self.endpoint(&["rulesets", name]);
        self.send_json(self.http().get(url), &format!("rule set '{}'", name))
            .await
    }

    pub async fn create_ruleset(&self, rule_set: &RuleSet) -> Result<RuleSet> {
        let url = self.endpoint(&["rulesets"]);
        tracing::info!(name = %rule_set.name, rules = rule_set.rules.len(), "Creating rule set");
        self.send_json(self.http().post(url).json(rule_set), "create rule set")
            .await
    }

    pub async fn update_ruleset(&self, name: &str, rule_set: &RuleSet) -> Result<RuleSet> {
        let url = self.endpoint(&["rulesets", name]);
        tracing::info!(name = %name, "Updating rule set");
        self.send_json(
            self.http().put(url).json(rule_set),
            &format!("update rule set '{}'", name),
        )
        .await
    }

    pub async fn delete_ruleset(&self, name: &str) -> Result<()> {
        let url = self.endpoint(&["rulesets", name]);
        self.send_text(self.http().delete(url), &format!("delete rule set '{}'", name))
            .await?;
        Ok(())
    }

    /// Catalog of rule types with their default description and params
    pub async fn available_rules(&self) -> Result<Vec<Rule>> {
        let url = self.endpoint(&["rulesets", "rules", "available"]);
        self.send_json(self.http().get(url), "available rules").await
    }
}
