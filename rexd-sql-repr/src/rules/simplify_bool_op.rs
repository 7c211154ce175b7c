use std::sync::Arc;

use itertools::Itertools;
use rexd_core::nodes::{RexBuilder, RexNode, Value};
use rexd_core::rules::{RewriteRule, RuleMatcher};
use strum::IntoEnumIterator;

use crate::rex_nodes::{
    ArcSqlRexNode, ConstantRex, LogOpRex, LogOpType, SqlReprRexNode, SqlRexType,
};

/// Simplifies n-ary `AND`/`OR` with boolean literals among the operands,
/// staying within three-valued logic: `FALSE` dominates an `AND` and `TRUE`
/// dominates an `OR` even when the remaining operands could be `NULL`;
/// identity literals are simply dropped.
pub struct SimplifyBoolOpRule {
    op_type: LogOpType,
    matcher: RuleMatcher<SqlRexType>,
}

impl SimplifyBoolOpRule {
    pub fn new(op_type: LogOpType) -> Self {
        Self {
            matcher: RuleMatcher::MatchOp {
                op: SqlRexType::LogOp(op_type),
            },
            op_type,
        }
    }

    /// One instance per logical operator, ready for registration.
    pub fn all() -> Vec<Arc<dyn RewriteRule<SqlRexType>>> {
        LogOpType::iter()
            .map(|op_type| Arc::new(Self::new(op_type)) as Arc<dyn RewriteRule<SqlRexType>>)
            .collect_vec()
    }
}

impl RewriteRule<SqlRexType> for SimplifyBoolOpRule {
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
        let log_op = LogOpRex::from_rex_node(call.clone())?;
        let absorbing = match self.op_type {
            LogOpType::And => false,
            LogOpType::Or => true,
        };
        let mut kept = Vec::with_capacity(log_op.operands().len());
        let mut dropped_any = false;
        for operand in log_op.operands() {
            match bool_literal(&operand) {
                Some(value) if value == absorbing => {
                    return Some(ConstantRex::bool(absorbing).into_rex_node());
                }
                Some(_) => dropped_any = true,
                None => kept.push(operand),
            }
        }
        if !dropped_any {
            return None;
        }
        let simplified = match kept.len() {
            0 => ConstantRex::bool(!absorbing).into_rex_node(),
            1 => kept.pop().unwrap(),
            _ => LogOpRex::new(self.op_type, kept).into_rex_node(),
        };
        (simplified.ty == call.ty).then_some(simplified)
    }

    fn name(&self) -> &'static str {
        "simplify_bool_op"
    }
}

fn bool_literal(node: &ArcSqlRexNode) -> Option<bool> {
    match ConstantRex::from_rex_node(node.clone())?.value() {
        Value::Bool(value) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;
    use pretty_assertions::assert_eq;

    use super::SimplifyBoolOpRule;
    use crate::rex_nodes::{
        ArcSqlRexNode, ColumnRefRex, ConstantRex, LogOpRex, LogOpType, SqlReprRexNode,
    };
    use crate::testing::new_test_rewriter_with_rules;

    fn col(index: usize) -> ArcSqlRexNode {
        ColumnRefRex::new(index, DataType::Boolean).into_rex_node()
    }

    fn lit(value: bool) -> ArcSqlRexNode {
        ConstantRex::bool(value).into_rex_node()
    }

    #[test]
    fn and_with_true_drops_the_literal() {
        let rewriter = new_test_rewriter_with_rules(SimplifyBoolOpRule::all());
        let tree = LogOpRex::new(LogOpType::And, vec![col(0), lit(true)]).into_rex_node();
        assert_eq!(rewriter.normalize(tree).unwrap(), col(0));
    }

    #[test]
    fn and_with_false_collapses() {
        let rewriter = new_test_rewriter_with_rules(SimplifyBoolOpRule::all());
        let tree =
            LogOpRex::new(LogOpType::And, vec![col(0), lit(false), col(1)]).into_rex_node();
        assert_eq!(rewriter.normalize(tree).unwrap(), lit(false));
    }

    #[test]
    fn or_with_false_drops_the_literal() {
        let rewriter = new_test_rewriter_with_rules(SimplifyBoolOpRule::all());
        let tree =
            LogOpRex::new(LogOpType::Or, vec![col(0), lit(false), col(1)]).into_rex_node();
        let expected = LogOpRex::new(LogOpType::Or, vec![col(0), col(1)]).into_rex_node();
        assert_eq!(rewriter.normalize(tree).unwrap(), expected);
    }

    #[test]
    fn or_with_true_collapses() {
        let rewriter = new_test_rewriter_with_rules(SimplifyBoolOpRule::all());
        let tree = LogOpRex::new(LogOpType::Or, vec![col(0), lit(true)]).into_rex_node();
        assert_eq!(rewriter.normalize(tree).unwrap(), lit(true));
    }

    #[test]
    fn all_identity_literals_collapse_to_the_neutral_literal() {
        let rewriter = new_test_rewriter_with_rules(SimplifyBoolOpRule::all());
        let tree = LogOpRex::new(LogOpType::And, vec![lit(true), lit(true)]).into_rex_node();
        assert_eq!(rewriter.normalize(tree).unwrap(), lit(true));
    }

    #[test]
    fn leaves_literal_free_operands_alone() {
        let rewriter = new_test_rewriter_with_rules(SimplifyBoolOpRule::all());
        let tree = LogOpRex::new(LogOpType::And, vec![col(0), col(1)]).into_rex_node();
        let out = rewriter.normalize(tree.clone()).unwrap();
        assert_eq!(out, tree);
    }
}
