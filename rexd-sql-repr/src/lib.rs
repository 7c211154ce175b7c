#![allow(clippy::new_without_default)]

use std::sync::Arc;

use anyhow::Result;
use rexd_core::registry::RuleRegistry;
use rexd_core::rewriter::{FixpointRewriter, Normalized};
use rexd_core::rules::RewriteRule;
use tracing::debug;

use rex_nodes::{ArcSqlRexNode, SqlRexType};
use rules::{
    EliminateArithIdentityRule, EliminateDoubleInversionRule, FoldConstantArithRule,
    SimpleTrigArithmeticRule, SimplifyBoolOpRule,
};

pub use rexd_core::nodes::Value;
pub use rexd_core::rewriter::Convergence;

pub mod rex_nodes;
pub mod rules;
#[cfg(test)]
mod testing;

/// Scalar-expression normalizer invoked by the query-compilation pipeline
/// between validation and physical planning. Immutable once built; safe to
/// share across concurrent compilations.
pub struct SqlScalarNormalizer {
    rewriter: FixpointRewriter<SqlRexType>,
}

impl SqlScalarNormalizer {
    /// The default rule set, in priority order: cheap structural
    /// eliminations first, then literal folding, then the wildcard trig
    /// reduction (which has to inspect every call).
    pub fn default_rules() -> Vec<Arc<dyn RewriteRule<SqlRexType>>> {
        let mut rules: Vec<Arc<dyn RewriteRule<SqlRexType>>> = vec![];
        rules.extend(EliminateDoubleInversionRule::all());
        rules.extend(EliminateArithIdentityRule::all());
        rules.extend(SimplifyBoolOpRule::all());
        rules.extend(FoldConstantArithRule::all());
        rules.push(Arc::new(SimpleTrigArithmeticRule::new()));
        rules
    }

    pub fn new() -> Self {
        Self::with_rules(Self::default_rules())
    }

    pub fn with_rules(rules: Vec<Arc<dyn RewriteRule<SqlRexType>>>) -> Self {
        debug!(event = "normalizer_init", num_rules = rules.len());
        Self {
            rewriter: FixpointRewriter::new(RuleRegistry::new_with_rules(rules)),
        }
    }

    /// Normalizes one scalar expression tree, returning a structurally and
    /// semantically equivalent tree.
    pub fn normalize(&self, root: ArcSqlRexNode) -> Result<ArcSqlRexNode> {
        self.rewriter.normalize(root)
    }

    /// As [`Self::normalize`], also reporting how the rewrite terminated.
    pub fn normalize_with_report(&self, root: ArcSqlRexNode) -> Result<Normalized<SqlRexType>> {
        self.rewriter.normalize_with_report(root)
    }
}
