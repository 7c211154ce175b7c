use crate::nodes::{ArcRexNode, RexBuilder, RexNode, RexNodeTyp};

/// Determines where a rule is indexed in the registry.
pub enum RuleMatcher<T: RexNodeTyp> {
    /// Keyed to a single operator kind; consulted only for calls of that
    /// kind.
    MatchOp { op: T },
    /// Consulted for every call, after the keyed rules.
    MatchAnyCall,
}

/// A rewrite rule replaces one call node with a semantically-equivalent,
/// cheaper form. Rules are stateless and reentrant; the registry shares
/// them read-only across concurrent rewrite sessions.
pub trait RewriteRule<T: RexNodeTyp>: 'static + Send + Sync {
    fn matcher(&self) -> &RuleMatcher<T>;

    /// Cheap, side-effect-free precondition checked before `rewrite`.
    ///
    /// A `true` here is necessary but not sufficient: `rewrite` may still
    /// decline after deeper inspection. Wildcard rules typically leave the
    /// default in place and do all their filtering at rewrite time.
    fn matches(&self, _call: &RexNode<T>) -> bool {
        true
    }

    /// Produces a replacement for `call`, or `None` when the call does not
    /// qualify after all. Declining is a normal outcome, not an error. The
    /// input is never mutated; replacements are built through `builder`.
    fn rewrite(&self, builder: &RexBuilder<T>, call: &ArcRexNode<T>) -> Option<ArcRexNode<T>>;

    fn name(&self) -> &'static str;
}
