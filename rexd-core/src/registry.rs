use std::collections::HashMap;
use std::sync::Arc;

use crate::nodes::RexNodeTyp;
use crate::rules::{RewriteRule, RuleMatcher};

/// Rules indexed by the operator kind they match, plus the wildcard rules
/// that must inspect every call. Built once at startup; read-only for the
/// process lifetime.
pub struct RuleRegistry<T: RexNodeTyp> {
    keyed: HashMap<T, Vec<Arc<dyn RewriteRule<T>>>>,
    wildcard: Vec<Arc<dyn RewriteRule<T>>>,
    num_rules: usize,
}

impl<T: RexNodeTyp> RuleRegistry<T> {
    /// Indexes `rules` by their matcher. Registration order is priority:
    /// within a candidate list, earlier rules are consulted first and the
    /// first rule that rewrites wins for that node in that pass.
    pub fn new_with_rules(rules: Vec<Arc<dyn RewriteRule<T>>>) -> Self {
        let num_rules = rules.len();
        let mut keyed: HashMap<T, Vec<Arc<dyn RewriteRule<T>>>> = HashMap::new();
        let mut wildcard = Vec::new();
        for rule in rules {
            let key = match rule.matcher() {
                RuleMatcher::MatchOp { op } => Some(op.clone()),
                RuleMatcher::MatchAnyCall => None,
            };
            match key {
                Some(op) => keyed.entry(op).or_default().push(rule),
                None => wildcard.push(rule),
            }
        }
        Self {
            keyed,
            wildcard,
            num_rules,
        }
    }

    /// Candidate rules for a call of kind `op`: the rules keyed to that
    /// kind followed by the wildcard rules, each in registration order.
    pub fn candidates<'a>(
        &'a self,
        op: &T,
    ) -> impl Iterator<Item = &'a Arc<dyn RewriteRule<T>>> {
        self.keyed
            .get(op)
            .map(|rules| rules.as_slice())
            .unwrap_or(&[])
            .iter()
            .chain(self.wildcard.iter())
    }

    pub fn num_rules(&self) -> usize {
        self.num_rules
    }

    pub fn is_empty(&self) -> bool {
        self.num_rules == 0
    }
}
