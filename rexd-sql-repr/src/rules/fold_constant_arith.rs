use std::sync::Arc;

use itertools::Itertools;
use rexd_core::nodes::{RexBuilder, RexNode, Value};
use rexd_core::rules::{RewriteRule, RuleMatcher};
use strum::IntoEnumIterator;

use crate::rex_nodes::{
    ArcSqlRexNode, BinOpType, ConstantRex, ConstantType, SqlReprRexNode, SqlRexType,
};

/// Folds arithmetic over two literals of the same numeric class into a
/// single literal. Folds that would change runtime behavior decline
/// instead: integer overflow and zero divisors are left for execution to
/// raise.
pub struct FoldConstantArithRule {
    op_type: BinOpType,
    matcher: RuleMatcher<SqlRexType>,
}

impl FoldConstantArithRule {
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

impl RewriteRule<SqlRexType> for FoldConstantArithRule {
    fn matcher(&self) -> &RuleMatcher<SqlRexType> {
        &self.matcher
    }

    fn matches(&self, call: &RexNode<SqlRexType>) -> bool {
        call.children
            .iter()
            .all(|child| matches!(child.typ, SqlRexType::Constant(_)))
    }

    fn rewrite(
        &self,
        builder: &RexBuilder<SqlRexType>,
        call: &ArcSqlRexNode,
    ) -> Option<ArcSqlRexNode> {
        let left = ConstantRex::from_rex_node(call.child(0))?;
        let right = ConstantRex::from_rex_node(call.child(1))?;
        let folded = match (left.value(), right.value()) {
            (Value::Int64(l), Value::Int64(r)) => Value::Int64(match self.op_type {
                BinOpType::Add => l.checked_add(r)?,
                BinOpType::Sub => l.checked_sub(r)?,
                BinOpType::Mul => l.checked_mul(r)?,
                BinOpType::Div => {
                    if r == 0 {
                        return None;
                    }
                    l.checked_div(r)?
                }
                _ => return None,
            }),
            (Value::Float(l), Value::Float(r)) => {
                let (l, r) = (l.into_inner(), r.into_inner());
                let folded = match self.op_type {
                    BinOpType::Add => l + r,
                    BinOpType::Sub => l - r,
                    BinOpType::Mul => l * r,
                    BinOpType::Div => {
                        if r == 0.0 {
                            return None;
                        }
                        l / r
                    }
                    _ => return None,
                };
                Value::Float(folded.into())
            }
            // Mixed classes need a cast decision; leave them alone.
            _ => return None,
        };
        let constant_type = ConstantType::from_value(&folded);
        if constant_type.into_data_type() != call.ty {
            return None;
        }
        Some(builder.leaf(
            SqlRexType::Constant(constant_type),
            folded,
            call.ty.clone(),
        ))
    }

    fn name(&self) -> &'static str {
        "fold_constant_arith"
    }
}
