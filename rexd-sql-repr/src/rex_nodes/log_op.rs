use std::sync::Arc;

use arrow_schema::DataType;
use itertools::Itertools;
use pretty_xmlish::Pretty;
use rexd_core::nodes::RexNode;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use super::{dispatch_rex_explain, ArcSqlRexNode, SqlReprRexNode, SqlRexType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum LogOpType {
    And,
    Or,
}

impl std::fmt::Display for LogOpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// N-ary logical conjunction/disjunction over boolean operands.
#[derive(Clone, Debug)]
pub struct LogOpRex(pub ArcSqlRexNode);

impl LogOpRex {
    pub fn new(op_type: LogOpType, operands: Vec<ArcSqlRexNode>) -> Self {
        assert!(operands.len() >= 2, "log op needs at least two operands");
        LogOpRex(Arc::new(RexNode {
            typ: SqlRexType::LogOp(op_type),
            children: operands,
            data: None,
            ty: DataType::Boolean,
        }))
    }

    pub fn operands(&self) -> Vec<ArcSqlRexNode> {
        self.0.children.clone()
    }

    pub fn op_type(&self) -> LogOpType {
        if let SqlRexType::LogOp(op_type) = &self.0.typ {
            *op_type
        } else {
            panic!("not a log op")
        }
    }
}

impl SqlReprRexNode for LogOpRex {
    fn into_rex_node(self) -> ArcSqlRexNode {
        self.0
    }

    fn from_rex_node(node: ArcSqlRexNode) -> Option<Self> {
        if !matches!(node.typ, SqlRexType::LogOp(_)) {
            return None;
        }
        Some(Self(node))
    }

    fn explain(&self) -> Pretty<'static> {
        Pretty::simple_record(
            self.op_type().to_string(),
            vec![],
            self.operands()
                .iter()
                .map(dispatch_rex_explain)
                .collect_vec(),
        )
    }
}
