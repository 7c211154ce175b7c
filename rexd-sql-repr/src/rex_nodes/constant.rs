use std::sync::Arc;

use arrow_schema::DataType;
use pretty_xmlish::Pretty;
use rexd_core::nodes::{RexNode, Value};
use serde::{Deserialize, Serialize};

use super::{ArcSqlRexNode, SqlReprRexNode, SqlRexType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstantType {
    Bool,
    Int64,
    UInt64,
    Float64,
    Utf8,
}

impl std::fmt::Display for ConstantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ConstantType {
    pub fn from_data_type(data_type: DataType) -> Self {
        match data_type {
            DataType::Boolean => ConstantType::Bool,
            DataType::Int64 => ConstantType::Int64,
            DataType::UInt64 => ConstantType::UInt64,
            DataType::Float64 => ConstantType::Float64,
            DataType::Utf8 => ConstantType::Utf8,
            other => unimplemented!("unsupported constant type {:?}", other),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(_) => ConstantType::Bool,
            Value::Int64(_) => ConstantType::Int64,
            Value::UInt64(_) => ConstantType::UInt64,
            Value::Float(_) => ConstantType::Float64,
            Value::String(_) => ConstantType::Utf8,
        }
    }

    pub fn into_data_type(self) -> DataType {
        match self {
            ConstantType::Bool => DataType::Boolean,
            ConstantType::Int64 => DataType::Int64,
            ConstantType::UInt64 => DataType::UInt64,
            ConstantType::Float64 => DataType::Float64,
            ConstantType::Utf8 => DataType::Utf8,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConstantRex(pub ArcSqlRexNode);

impl ConstantRex {
    pub fn new(value: Value) -> Self {
        let typ = ConstantType::from_value(&value);
        Self::new_with_type(value, typ)
    }

    pub fn new_with_type(value: Value, typ: ConstantType) -> Self {
        ConstantRex(Arc::new(RexNode {
            typ: SqlRexType::Constant(typ),
            children: vec![],
            data: Some(value),
            ty: typ.into_data_type(),
        }))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Value::Bool(value))
    }

    pub fn int64(value: i64) -> Self {
        Self::new(Value::Int64(value))
    }

    pub fn uint64(value: u64) -> Self {
        Self::new(Value::UInt64(value))
    }

    pub fn float64(value: f64) -> Self {
        Self::new(Value::Float(value.into()))
    }

    pub fn string(value: impl AsRef<str>) -> Self {
        Self::new(Value::String(value.as_ref().into()))
    }

    /// Gets the constant value.
    pub fn value(&self) -> Value {
        self.0.data.clone().unwrap()
    }

    pub fn constant_type(&self) -> ConstantType {
        if let SqlRexType::Constant(typ) = &self.0.typ {
            *typ
        } else {
            panic!("not a constant")
        }
    }
}

impl SqlReprRexNode for ConstantRex {
    fn into_rex_node(self) -> ArcSqlRexNode {
        self.0
    }

    fn from_rex_node(node: ArcSqlRexNode) -> Option<Self> {
        if !matches!(node.typ, SqlRexType::Constant(_)) {
            return None;
        }
        Some(Self(node))
    }

    fn explain(&self) -> Pretty<'static> {
        Pretty::display(&self.value())
    }
}
