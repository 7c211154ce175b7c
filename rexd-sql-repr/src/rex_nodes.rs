//! Typed interface of SQL scalar expression nodes.

mod bin_op;
mod column_ref;
mod constant;
mod func;
mod log_op;
mod un_op;

use arrow_schema::DataType;
use pretty_xmlish::{Pretty, PrettyConfig};
use rexd_core::nodes::{ArcRexNode, RexNode, RexNodeTyp};
use serde::{Deserialize, Serialize};

pub use bin_op::{BinOpRex, BinOpType};
pub use column_ref::ColumnRefRex;
pub use constant::{ConstantRex, ConstantType};
pub use func::{FuncRex, FuncType};
pub use log_op::{LogOpRex, LogOpType};
pub use un_op::{UnOpRex, UnOpType};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlRexType {
    // Leaves
    Constant(ConstantType),
    ColumnRef,
    // Calls
    UnOp(UnOpType),
    BinOp(BinOpType),
    LogOp(LogOpType),
    Func(FuncType),
}

impl std::fmt::Display for SqlRexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl RexNodeTyp for SqlRexType {
    type Ty = DataType;

    fn is_call(&self) -> bool {
        matches!(
            self,
            Self::UnOp(_) | Self::BinOp(_) | Self::LogOp(_) | Self::Func(_)
        )
    }
}

pub type SqlRexNode = RexNode<SqlRexType>;
pub type ArcSqlRexNode = ArcRexNode<SqlRexType>;

/// Typed view over an [`ArcSqlRexNode`], one wrapper per node kind.
pub trait SqlReprRexNode: 'static + Clone {
    fn into_rex_node(self) -> ArcSqlRexNode;

    fn from_rex_node(node: ArcSqlRexNode) -> Option<Self>;

    fn explain(&self) -> Pretty<'static>;

    fn explain_to_string(&self) -> String {
        let mut config = PrettyConfig {
            need_boundaries: false,
            reduced_spaces: false,
            width: 300,
            ..Default::default()
        };
        let mut out = String::new();
        config.unicode(&mut out, &self.explain());
        out
    }
}

pub fn dispatch_rex_explain(node: &ArcSqlRexNode) -> Pretty<'static> {
    match &node.typ {
        SqlRexType::Constant(_) => ConstantRex::from_rex_node(node.clone()).unwrap().explain(),
        SqlRexType::ColumnRef => ColumnRefRex::from_rex_node(node.clone()).unwrap().explain(),
        SqlRexType::UnOp(_) => UnOpRex::from_rex_node(node.clone()).unwrap().explain(),
        SqlRexType::BinOp(_) => BinOpRex::from_rex_node(node.clone()).unwrap().explain(),
        SqlRexType::LogOp(_) => LogOpRex::from_rex_node(node.clone()).unwrap().explain(),
        SqlRexType::Func(_) => FuncRex::from_rex_node(node.clone()).unwrap().explain(),
    }
}

pub fn rex_explain_to_string(node: &ArcSqlRexNode) -> String {
    let mut config = PrettyConfig {
        need_boundaries: false,
        reduced_spaces: false,
        width: 300,
        ..Default::default()
    };
    let mut out = String::new();
    config.unicode(&mut out, &dispatch_rex_explain(node));
    out
}
