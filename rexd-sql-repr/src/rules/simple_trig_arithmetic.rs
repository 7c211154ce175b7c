use rexd_core::nodes::{RexBuilder, Value};
use rexd_core::rules::{RewriteRule, RuleMatcher};
use tracing::trace;

use crate::rex_nodes::{
    ArcSqlRexNode, BinOpRex, BinOpType, ConstantRex, FuncRex, FuncType, SqlReprRexNode, SqlRexType,
    UnOpType,
};

/// Relative tolerance when deciding whether a literal shift is a whole
/// multiple of pi.
const PERIOD_EPSILON: f64 = 1.0e-9;

/// Reduces trigonometric calls whose argument carries a constant additive
/// shift that is a whole multiple of pi:
///
/// - `sin(x + 2pi) -> sin(x)`, and likewise for `cos`;
/// - `sin(x + pi) -> -sin(x)` (odd multiples flip the sign), and likewise
///   for `cos`;
/// - `tan(x + k*pi) -> tan(x)` for any whole `k`.
///
/// Registered as a wildcard rule: it has to look inside every call to
/// decide applicability, so `matches` stays unconditionally true and all
/// the filtering happens at rewrite time.
pub struct SimpleTrigArithmeticRule {
    matcher: RuleMatcher<SqlRexType>,
}

impl SimpleTrigArithmeticRule {
    pub fn new() -> Self {
        Self {
            matcher: RuleMatcher::MatchAnyCall,
        }
    }
}

impl RewriteRule<SqlRexType> for SimpleTrigArithmeticRule {
    fn matcher(&self) -> &RuleMatcher<SqlRexType> {
        &self.matcher
    }

    fn rewrite(
        &self,
        builder: &RexBuilder<SqlRexType>,
        call: &ArcSqlRexNode,
    ) -> Option<ArcSqlRexNode> {
        let func = FuncRex::from_rex_node(call.clone())?;
        let trig = func.func();
        if !trig.is_trig() || func.0.children.len() != 1 {
            return None;
        }
        let arg = BinOpRex::from_rex_node(func.arg_at(0))?;
        let (base, shift) = match arg.op_type() {
            BinOpType::Add => match constant_f64(&arg.right()) {
                Some(shift) => (arg.left(), shift),
                None => (arg.right(), constant_f64(&arg.left())?),
            },
            BinOpType::Sub => (arg.left(), -constant_f64(&arg.right())?),
            _ => return None,
        };
        let half_periods = whole_half_periods(shift)?;
        if half_periods == 0 {
            return None;
        }
        trace!(
            event = "trig_shift_reduced",
            func = %trig,
            half_periods,
            call = %call,
        );
        let reduced = builder.call(SqlRexType::Func(trig), vec![base], call.ty.clone());
        let flips_sign = trig != FuncType::Tan && half_periods.rem_euclid(2) == 1;
        if flips_sign {
            Some(builder.call(
                SqlRexType::UnOp(UnOpType::Neg),
                vec![reduced],
                call.ty.clone(),
            ))
        } else {
            Some(reduced)
        }
    }

    fn name(&self) -> &'static str {
        "simple_trig_arithmetic"
    }
}

fn constant_f64(node: &ArcSqlRexNode) -> Option<f64> {
    let constant = ConstantRex::from_rex_node(node.clone())?;
    match constant.value() {
        Value::Float(v) => Some(v.into_inner()),
        Value::Int64(v) => Some(v as f64),
        Value::UInt64(v) => Some(v as f64),
        _ => None,
    }
}

/// `Some(k)` when `shift` equals `k * pi` within tolerance.
fn whole_half_periods(shift: f64) -> Option<i64> {
    if !shift.is_finite() {
        return None;
    }
    let k = (shift / std::f64::consts::PI).round();
    if k.abs() >= i64::MAX as f64 {
        return None;
    }
    if (shift - k * std::f64::consts::PI).abs() > PERIOD_EPSILON * shift.abs().max(1.0) {
        return None;
    }
    Some(k as i64)
}
