use std::sync::Arc;

use arrow_schema::DataType;
use itertools::Itertools;
use pretty_xmlish::Pretty;
use rexd_core::nodes::RexNode;
use serde::{Deserialize, Serialize};

use super::{dispatch_rex_explain, ArcSqlRexNode, SqlReprRexNode, SqlRexType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuncType {
    Sin,
    Cos,
    Tan,
    Abs,
}

impl std::fmt::Display for FuncType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FuncType {
    pub fn is_trig(&self) -> bool {
        matches!(self, Self::Sin | Self::Cos | Self::Tan)
    }
}

#[derive(Clone, Debug)]
pub struct FuncRex(pub ArcSqlRexNode);

impl FuncRex {
    pub fn new(func_id: FuncType, argv: Vec<ArcSqlRexNode>) -> Self {
        let ty = match func_id {
            FuncType::Sin | FuncType::Cos | FuncType::Tan => DataType::Float64,
            FuncType::Abs => argv[0].ty.clone(),
        };
        FuncRex(Arc::new(RexNode {
            typ: SqlRexType::Func(func_id),
            children: argv,
            data: None,
            ty,
        }))
    }

    /// Gets the i-th argument of the function.
    pub fn arg_at(&self, i: usize) -> ArcSqlRexNode {
        self.0.child(i)
    }

    /// Get all arguments.
    pub fn args(&self) -> Vec<ArcSqlRexNode> {
        self.0.children.clone()
    }

    /// Gets the function id.
    pub fn func(&self) -> FuncType {
        if let SqlRexType::Func(func_id) = &self.0.typ {
            *func_id
        } else {
            panic!("not a function")
        }
    }
}

impl SqlReprRexNode for FuncRex {
    fn into_rex_node(self) -> ArcSqlRexNode {
        self.0
    }

    fn from_rex_node(node: ArcSqlRexNode) -> Option<Self> {
        if !matches!(node.typ, SqlRexType::Func(_)) {
            return None;
        }
        Some(Self(node))
    }

    fn explain(&self) -> Pretty<'static> {
        Pretty::simple_record(
            self.func().to_string(),
            vec![],
            self.args().iter().map(dispatch_rex_explain).collect_vec(),
        )
    }
}
