use std::sync::Arc;

use itertools::Itertools;
use rexd_core::nodes::{RexBuilder, RexNode};
use rexd_core::rules::{RewriteRule, RuleMatcher};
use strum::IntoEnumIterator;

use crate::rex_nodes::{ArcSqlRexNode, SqlReprRexNode, SqlRexType, UnOpRex, UnOpType};

/// Cancels a unary operator applied to itself: `NOT(NOT x) -> x` and
/// `-(-x) -> x`. Both are involutions under SQL semantics, `NULL` included.
pub struct EliminateDoubleInversionRule {
    op_type: UnOpType,
    matcher: RuleMatcher<SqlRexType>,
}

impl EliminateDoubleInversionRule {
    pub fn new(op_type: UnOpType) -> Self {
        Self {
            matcher: RuleMatcher::MatchOp {
                op: SqlRexType::UnOp(op_type),
            },
            op_type,
        }
    }

    /// One instance per unary operator, ready for registration.
    pub fn all() -> Vec<Arc<dyn RewriteRule<SqlRexType>>> {
        UnOpType::iter()
            .map(|op_type| Arc::new(Self::new(op_type)) as Arc<dyn RewriteRule<SqlRexType>>)
            .collect_vec()
    }
}

impl RewriteRule<SqlRexType> for EliminateDoubleInversionRule {
    fn matcher(&self) -> &RuleMatcher<SqlRexType> {
        &self.matcher
    }

    fn matches(&self, call: &RexNode<SqlRexType>) -> bool {
        call.children
            .first()
            .map(|child| child.typ == SqlRexType::UnOp(self.op_type))
            .unwrap_or(false)
    }

    fn rewrite(
        &self,
        _builder: &RexBuilder<SqlRexType>,
        call: &ArcSqlRexNode,
    ) -> Option<ArcSqlRexNode> {
        let outer = UnOpRex::from_rex_node(call.clone())?;
        let inner = UnOpRex::from_rex_node(outer.operand())?;
        if inner.op_type() != self.op_type {
            return None;
        }
        let kept = inner.operand();
        (kept.ty == call.ty).then_some(kept)
    }

    fn name(&self) -> &'static str {
        "eliminate_double_inversion"
    }
}
