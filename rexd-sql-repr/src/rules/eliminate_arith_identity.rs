use std::sync::Arc;

use itertools::Itertools;
use rexd_core::nodes::{RexBuilder, RexNode, Value};
use rexd_core::rules::{RewriteRule, RuleMatcher};
use strum::IntoEnumIterator;

use crate::rex_nodes::{ArcSqlRexNode, BinOpRex, BinOpType, ConstantRex, SqlReprRexNode, SqlRexType};

/// Drops arithmetic no-ops: `x + 0`, `0 + x`, `x - 0`, `x * 1`, `1 * x`,
/// and `x / 1` become `x`.
///
/// Null-safe by construction (`NULL` combined with the identity literal is
/// still `NULL`), and only fires when the surviving operand already has the
/// call's result type, so an implicit promotion is never dropped.
pub struct EliminateArithIdentityRule {
    op_type: BinOpType,
    matcher: RuleMatcher<SqlRexType>,
}

impl EliminateArithIdentityRule {
    pub fn new(op_type: BinOpType) -> Self {
        assert!(op_type.is_numerical());
        Self {
            matcher: RuleMatcher::MatchOp {
                op: SqlRexType::BinOp(op_type),
            },
            op_type,
        }
    }

    /// One instance per arithmetic operator, ready for registration.
    pub fn all() -> Vec<Arc<dyn RewriteRule<SqlRexType>>> {
        BinOpType::iter()
            .filter(|op_type| op_type.is_numerical())
            .map(|op_type| Arc::new(Self::new(op_type)) as Arc<dyn RewriteRule<SqlRexType>>)
            .collect_vec()
    }
}

impl RewriteRule<SqlRexType> for EliminateArithIdentityRule {
    fn matcher(&self) -> &RuleMatcher<SqlRexType> {
        &self.matcher
    }

    fn matches(&self, call: &RexNode<SqlRexType>) -> bool {
        call.children
            .iter()
            .any(|child| matches!(child.typ, SqlRexType::Constant(_)))
    }

    fn rewrite(
        &self,
        _builder: &RexBuilder<SqlRexType>,
        call: &ArcSqlRexNode,
    ) -> Option<ArcSqlRexNode> {
        let bin_op = BinOpRex::from_rex_node(call.clone())?;
        let (left, right) = (bin_op.left(), bin_op.right());
        let kept = match self.op_type {
            BinOpType::Add => {
                if is_zero(&right) {
                    left
                } else if is_zero(&left) {
                    right
                } else {
                    return None;
                }
            }
            BinOpType::Sub => {
                if is_zero(&right) {
                    left
                } else {
                    return None;
                }
            }
            BinOpType::Mul => {
                if is_one(&right) {
                    left
                } else if is_one(&left) {
                    right
                } else {
                    return None;
                }
            }
            BinOpType::Div => {
                if is_one(&right) {
                    left
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        (kept.ty == call.ty).then_some(kept)
    }

    fn name(&self) -> &'static str {
        "eliminate_arith_identity"
    }
}

fn literal(node: &ArcSqlRexNode) -> Option<Value> {
    ConstantRex::from_rex_node(node.clone()).map(|constant| constant.value())
}

fn is_zero(node: &ArcSqlRexNode) -> bool {
    match literal(node) {
        Some(Value::Int64(v)) => v == 0,
        Some(Value::UInt64(v)) => v == 0,
        Some(Value::Float(v)) => v.into_inner() == 0.0,
        _ => false,
    }
}

fn is_one(node: &ArcSqlRexNode) -> bool {
    match literal(node) {
        Some(Value::Int64(v)) => v == 1,
        Some(Value::UInt64(v)) => v == 1,
        Some(Value::Float(v)) => v.into_inner() == 1.0,
        _ => false,
    }
}
