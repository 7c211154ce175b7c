//! Representation-generic scalar expression nodes.

use std::collections::hash_map::DefaultHasher;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Literal payload carried by leaf nodes.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    Float(OrderedFloat<f64>),
    String(Arc<str>),
}

impl Value {
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(v) => *v,
            _ => panic!("invalid value type: {:?}", self),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Value::Int64(v) => *v,
            _ => panic!("invalid value type: {:?}", self),
        }
    }

    pub fn as_u64(&self) -> u64 {
        match self {
            Value::UInt64(v) => *v,
            _ => panic!("invalid value type: {:?}", self),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Float(v) => v.into_inner(),
            _ => panic!("invalid value type: {:?}", self),
        }
    }

    pub fn as_str(&self) -> Arc<str> {
        match self {
            Value::String(v) => v.clone(),
            _ => panic!("invalid value type: {:?}", self),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "\"{}\"", v),
        }
    }
}

/// Node-kind tag of a scalar expression representation.
///
/// A representation supplies one kind value per operator (calls) and per
/// leaf class (literals, references), plus the result-type vocabulary the
/// nodes are annotated with.
pub trait RexNodeTyp:
    PartialEq + Eq + Hash + Clone + 'static + Display + Debug + Send + Sync
{
    /// Result type attached to every node of this kind.
    type Ty: PartialEq + Eq + Hash + Clone + Debug + Send + Sync + 'static;

    /// Whether nodes of this kind are calls (an operator applied to ordered
    /// operands), as opposed to leaves.
    fn is_call(&self) -> bool;
}

/// An immutable scalar expression node. Equality and hashing are
/// structural.
///
/// A call's result type is a pure function of its operator and operand
/// types; rewriting never changes a node's result type.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RexNode<T: RexNodeTyp> {
    pub typ: T,
    pub children: Vec<ArcRexNode<T>>,
    pub data: Option<Value>,
    pub ty: T::Ty,
}

pub type ArcRexNode<T> = Arc<RexNode<T>>;

impl<T: RexNodeTyp> RexNode<T> {
    /// Gets the `idx`-th operand.
    pub fn child(&self, idx: usize) -> ArcRexNode<T> {
        self.children[idx].clone()
    }

    pub fn is_call(&self) -> bool {
        self.typ.is_call()
    }

    /// Constructs the same call with replaced operands.
    pub fn with_children(&self, children: Vec<ArcRexNode<T>>) -> RexNode<T> {
        RexNode {
            typ: self.typ.clone(),
            children,
            data: self.data.clone(),
            ty: self.ty.clone(),
        }
    }

    /// Structural hash, used by the driver to recognize recurring tree
    /// states.
    pub fn signature(&self) -> u64 {
        let mut state = DefaultHasher::new();
        self.hash(&mut state);
        state.finish()
    }
}

impl<T: RexNodeTyp> Display for RexNode<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.children.is_empty() {
            match &self.data {
                Some(data) => write!(f, "{}({})", self.typ, data),
                None => write!(f, "{}", self.typ),
            }
        } else {
            write!(
                f,
                "({} {})",
                self.typ,
                self.children.iter().map(|child| child.to_string()).join(" ")
            )
        }
    }
}

/// Capability handed to rules for constructing replacement nodes, keeping
/// rules decoupled from the node constructors.
pub struct RexBuilder<T: RexNodeTyp> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: RexNodeTyp> RexBuilder<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    pub fn call(&self, typ: T, children: Vec<ArcRexNode<T>>, ty: T::Ty) -> ArcRexNode<T> {
        debug_assert!(typ.is_call());
        Arc::new(RexNode {
            typ,
            children,
            data: None,
            ty,
        })
    }

    pub fn leaf(&self, typ: T, data: Value, ty: T::Ty) -> ArcRexNode<T> {
        debug_assert!(!typ.is_call());
        Arc::new(RexNode {
            typ,
            children: vec![],
            data: Some(data),
            ty,
        })
    }
}
