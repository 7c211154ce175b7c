use std::sync::Arc;

use arrow_schema::DataType;
use pretty_xmlish::Pretty;
use rexd_core::nodes::{RexNode, Value};

use super::{ArcSqlRexNode, SqlReprRexNode, SqlRexType};

/// A reference to the `index`-th column of the enclosing relation, with the
/// column's type attached by the validator.
#[derive(Clone, Debug)]
pub struct ColumnRefRex(pub ArcSqlRexNode);

impl ColumnRefRex {
    pub fn new(index: usize, ty: DataType) -> Self {
        ColumnRefRex(Arc::new(RexNode {
            typ: SqlRexType::ColumnRef,
            children: vec![],
            data: Some(Value::UInt64(index as u64)),
            ty,
        }))
    }

    /// Gets the column index.
    pub fn index(&self) -> usize {
        self.0.data.as_ref().unwrap().as_u64() as usize
    }
}

impl SqlReprRexNode for ColumnRefRex {
    fn into_rex_node(self) -> ArcSqlRexNode {
        self.0
    }

    fn from_rex_node(node: ArcSqlRexNode) -> Option<Self> {
        if !matches!(node.typ, SqlRexType::ColumnRef) {
            return None;
        }
        Some(Self(node))
    }

    fn explain(&self) -> Pretty<'static> {
        Pretty::display(&format!("#{}", self.index()))
    }
}
