use std::sync::Arc;

use arrow_schema::DataType;
use pretty_xmlish::Pretty;
use rexd_core::nodes::RexNode;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use super::{dispatch_rex_explain, ArcSqlRexNode, SqlReprRexNode, SqlRexType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum UnOpType {
    Neg,
    Not,
}

impl std::fmt::Display for UnOpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug)]
pub struct UnOpRex(pub ArcSqlRexNode);

impl UnOpRex {
    pub fn new(op_type: UnOpType, operand: ArcSqlRexNode) -> Self {
        let ty = match op_type {
            UnOpType::Neg => operand.ty.clone(),
            UnOpType::Not => DataType::Boolean,
        };
        UnOpRex(Arc::new(RexNode {
            typ: SqlRexType::UnOp(op_type),
            children: vec![operand],
            data: None,
            ty,
        }))
    }

    pub fn operand(&self) -> ArcSqlRexNode {
        self.0.child(0)
    }

    pub fn op_type(&self) -> UnOpType {
        if let SqlRexType::UnOp(op_type) = &self.0.typ {
            *op_type
        } else {
            panic!("not an un op")
        }
    }
}

impl SqlReprRexNode for UnOpRex {
    fn into_rex_node(self) -> ArcSqlRexNode {
        self.0
    }

    fn from_rex_node(node: ArcSqlRexNode) -> Option<Self> {
        if !matches!(node.typ, SqlRexType::UnOp(_)) {
            return None;
        }
        Some(Self(node))
    }

    fn explain(&self) -> Pretty<'static> {
        Pretty::simple_record(
            self.op_type().to_string(),
            vec![],
            vec![dispatch_rex_explain(&self.operand())],
        )
    }
}
