mod eliminate_arith_identity;
mod eliminate_double_inversion;
mod fold_constant_arith;
mod simple_trig_arithmetic;
mod simplify_bool_op;

pub use eliminate_arith_identity::EliminateArithIdentityRule;
pub use eliminate_double_inversion::EliminateDoubleInversionRule;
pub use fold_constant_arith::FoldConstantArithRule;
pub use simple_trig_arithmetic::SimpleTrigArithmeticRule;
pub use simplify_bool_op::SimplifyBoolOpRule;
