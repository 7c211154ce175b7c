use std::sync::Arc;

use arrow_schema::DataType;
use pretty_xmlish::Pretty;
use rexd_core::nodes::RexNode;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use super::{dispatch_rex_explain, ArcSqlRexNode, SqlReprRexNode, SqlRexType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum BinOpType {
    // numerical
    Add,
    Sub,
    Mul,
    Div,
    // comparison
    Eq,
    Neq,
    Gt,
    Lt,
    Geq,
    Leq,
}

impl std::fmt::Display for BinOpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl BinOpType {
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Neq | Self::Gt | Self::Lt | Self::Geq | Self::Leq
        )
    }
}

/// Numeric result type of an arithmetic operator over the two operand
/// types.
fn numeric_promotion(left: &DataType, right: &DataType) -> DataType {
    if left == &DataType::Float64 || right == &DataType::Float64 {
        DataType::Float64
    } else if left == &DataType::Int64 || right == &DataType::Int64 {
        DataType::Int64
    } else {
        left.clone()
    }
}

#[derive(Clone, Debug)]
pub struct BinOpRex(pub ArcSqlRexNode);

impl BinOpRex {
    pub fn new(op_type: BinOpType, left: ArcSqlRexNode, right: ArcSqlRexNode) -> Self {
        let ty = if op_type.is_comparison() {
            DataType::Boolean
        } else {
            numeric_promotion(&left.ty, &right.ty)
        };
        BinOpRex(Arc::new(RexNode {
            typ: SqlRexType::BinOp(op_type),
            children: vec![left, right],
            data: None,
            ty,
        }))
    }

    pub fn left(&self) -> ArcSqlRexNode {
        self.0.child(0)
    }

    pub fn right(&self) -> ArcSqlRexNode {
        self.0.child(1)
    }

    pub fn op_type(&self) -> BinOpType {
        if let SqlRexType::BinOp(op_type) = &self.0.typ {
            *op_type
        } else {
            panic!("not a bin op")
        }
    }
}

impl SqlReprRexNode for BinOpRex {
    fn into_rex_node(self) -> ArcSqlRexNode {
        self.0
    }

    fn from_rex_node(node: ArcSqlRexNode) -> Option<Self> {
        if !matches!(node.typ, SqlRexType::BinOp(_)) {
            return None;
        }
        Some(Self(node))
    }

    fn explain(&self) -> Pretty<'static> {
        Pretty::simple_record(
            self.op_type().to_string(),
            vec![],
            vec![
                dispatch_rex_explain(&self.left()),
                dispatch_rex_explain(&self.right()),
            ],
        )
    }
}
