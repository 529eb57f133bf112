use glob::Pattern;
use salesdesk_core::Identity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    pub name: String,
    pub subject_type: SubjectType,
    #[serde(default)]
    pub subject_id: Option<String>,
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resource: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    User,
    Role,
    Any,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone)]
pub struct PolicySet {
    rules: Vec<PolicyRule>,
    default_allow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny,
    NoMatch,
}

impl PolicySet {
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            rules: Vec::new(),
            default_allow: true,
        }
    }

    #[must_use]
    pub fn from_rules(rules: Vec<PolicyRule>) -> Self {
        Self {
            rules,
            default_allow: false,
        }
    }

    #[must_use]
    pub fn is_allowed(&self, identity: &Identity, action: &str, resource: &str) -> bool {
        matches!(
            self.evaluate(identity, action, resource),
            PolicyDecision::Allow
        )
    }

    #[must_use]
    pub fn evaluate(&self, identity: &Identity, action: &str, resource: &str) -> PolicyDecision {
        let mut any_allow = false;
        for rule in &self.rules {
            if !matches_subject(identity, rule) {
                continue;
            }
            if !matches_action(&rule.actions, action) {
                continue;
            }
            if !matches_pattern(&rule.resource, resource) {
                continue;
            }

            match rule.effect {
                Effect::Deny => return PolicyDecision::Deny,
                Effect::Allow => any_allow = true,
            }
        }

        if any_allow || self.default_allow {
            return PolicyDecision::Allow;
        }

        PolicyDecision::NoMatch
    }
}

fn matches_subject(identity: &Identity, rule: &PolicyRule) -> bool {
    match rule.subject_type {
        SubjectType::Any => true,
        SubjectType::User => rule
            .subject_id
            .as_deref()
            .is_some_and(|id| id == identity.user_id.to_string()),
        SubjectType::Role => rule
            .subject_id
            .as_deref()
            .is_some_and(|role| role.eq_ignore_ascii_case(identity.role.as_str())),
    }
}

fn matches_action(actions: &[String], action: &str) -> bool {
    actions
        .iter()
        .any(|pattern| matches_pattern(pattern, action))
}

fn matches_pattern(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    Pattern::new(pattern)
        .map(|compiled| compiled.matches(value))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesdesk_core::UserRole;
    use uuid::Uuid;

    fn identity(role: UserRole) -> Identity {
        Identity::new(Uuid::now_v7(), role)
    }

    fn default_rules() -> PolicySet {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../config/policies.default.yaml");
        let rules: Vec<PolicyRule> =
            serde_yaml::from_str(&std::fs::read_to_string(path).expect("policy file"))
                .expect("parse policies");
        PolicySet::from_rules(rules)
    }

    #[test]
    fn matches_pattern_allows_wildcards() {
        assert!(matches_pattern("*", "anything"));
        assert!(matches_pattern("groups*", "groups"));
        assert!(matches_pattern("groups*", "groups/abc/members"));
        assert!(matches_pattern("deals/*", "deals/abc"));
    }

    #[test]
    fn matches_pattern_rejects_non_matching() {
        assert!(!matches_pattern("deals/*", "deals"));
        assert!(!matches_pattern("read", "write"));
        assert!(!matches_pattern("[", "["));
    }

    #[test]
    fn empty_policy_set_denies_by_default() {
        let policies = PolicySet::from_rules(Vec::new());
        assert!(!policies.is_allowed(&identity(UserRole::Admin), "read", "groups"));
    }

    #[test]
    fn deny_rule_wins_over_allow() {
        let user = identity(UserRole::Manager);
        let rules = vec![
            PolicyRule {
                name: "allow".to_string(),
                subject_type: SubjectType::Any,
                subject_id: None,
                effect: Effect::Allow,
                actions: vec!["*".to_string()],
                resource: "*".to_string(),
            },
            PolicyRule {
                name: "deny-one".to_string(),
                subject_type: SubjectType::User,
                subject_id: Some(user.user_id.to_string()),
                effect: Effect::Deny,
                actions: vec!["delete".to_string()],
                resource: "groups/*".to_string(),
            },
        ];
        let policies = PolicySet::from_rules(rules);
        assert_eq!(
            policies.evaluate(&user, "delete", "groups/1"),
            PolicyDecision::Deny
        );
        assert!(policies.is_allowed(&user, "write", "groups/1"));
    }

    #[test]
    fn default_policies_let_managers_edit_groups_only() {
        let policies = default_rules();
        let manager = identity(UserRole::Manager);
        let sales = identity(UserRole::Sales);
        let admin = identity(UserRole::Admin);

        assert!(policies.is_allowed(&manager, "write", "groups/x/members"));
        assert!(!policies.is_allowed(&sales, "write", "groups/x/members"));
        assert!(policies.is_allowed(&sales, "read", "groups/x"));
        assert!(policies.is_allowed(&sales, "write", "deals/x"));
        assert!(policies.is_allowed(&admin, "delete", "groups/x"));
    }

    proptest::proptest! {
        #[test]
        fn sales_can_read_but_never_rewrite_any_group(raw in proptest::prelude::any::<u128>()) {
            let policies = default_rules();
            let sales = identity(UserRole::Sales);
            let group = Uuid::from_u128(raw);
            let detail = format!("groups/{}", group);
            let members = format!("groups/{}/members", group);
            proptest::prop_assert!(policies.is_allowed(&sales, "read", &detail));
            proptest::prop_assert!(!policies.is_allowed(&sales, "write", &members));
        }
    }
}
