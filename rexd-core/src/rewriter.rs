//! First-match dispatch and the bottom-up fixed-point driver.

use std::collections::VecDeque;

use anyhow::{ensure, Result};
use tracing::{debug, trace, warn};

use crate::nodes::{ArcRexNode, RexBuilder, RexNodeTyp};
use crate::registry::RuleRegistry;
use crate::rules::RewriteRule;

/// Default bound on full-tree passes per `normalize` call. No legitimate
/// rule set should need more passes to converge on one expression.
pub const DEFAULT_ITERATION_CAP: usize = 16;

/// Root signatures remembered per session; catches oscillation cycles of
/// length 2-3.
const SIGNATURE_HISTORY: usize = 4;

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW: usize = 16 * 1024 * 1024;

/// How a `normalize` call terminated. Only `Stable` guarantees that no
/// further local rewrite opportunity exists under the registered rule set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Convergence {
    /// A full pass fired no rule.
    Stable,
    /// The pass cap was reached first.
    IterationCapped,
    /// A recent tree state recurred: two or more rules are undoing each
    /// other.
    Oscillation,
}

#[derive(Clone, Debug)]
pub struct Normalized<T: RexNodeTyp> {
    pub node: ArcRexNode<T>,
    pub convergence: Convergence,
    pub passes: usize,
    pub rewrites_fired: usize,
}

/// Per-walk state, created when `normalize` starts and discarded when it
/// returns.
struct RewriteSession {
    fired_this_pass: usize,
    rewrites_fired: usize,
    recent_signatures: VecDeque<u64>,
}

impl RewriteSession {
    fn new(root_signature: u64) -> Self {
        let mut recent_signatures = VecDeque::with_capacity(SIGNATURE_HISTORY);
        recent_signatures.push_back(root_signature);
        Self {
            fired_this_pass: 0,
            rewrites_fired: 0,
            recent_signatures,
        }
    }

    fn seen_recently(&self, signature: u64) -> bool {
        self.recent_signatures.contains(&signature)
    }

    fn record(&mut self, signature: u64) {
        if self.recent_signatures.len() == SIGNATURE_HISTORY {
            self.recent_signatures.pop_front();
        }
        self.recent_signatures.push_back(signature);
    }
}

/// Applies registered rules bottom-up over a tree until no rule fires or a
/// termination guard trips. Immutable after construction; one value may
/// serve concurrent sessions on independent trees.
pub struct FixpointRewriter<T: RexNodeTyp> {
    registry: RuleRegistry<T>,
    builder: RexBuilder<T>,
    iteration_cap: usize,
}

impl<T: RexNodeTyp> FixpointRewriter<T> {
    pub fn new(registry: RuleRegistry<T>) -> Self {
        Self {
            registry,
            builder: RexBuilder::new(),
            iteration_cap: DEFAULT_ITERATION_CAP,
        }
    }

    pub fn with_iteration_cap(mut self, cap: usize) -> Self {
        assert!(cap >= 1, "iteration cap must allow at least one pass");
        self.iteration_cap = cap;
        self
    }

    /// Normalizes `root`, returning the rewritten tree. The only error is a
    /// registered rule producing a type-incompatible replacement, which is
    /// a defect in that rule.
    pub fn normalize(&self, root: ArcRexNode<T>) -> Result<ArcRexNode<T>> {
        Ok(self.normalize_with_report(root)?.node)
    }

    /// As `normalize`, also reporting how the walk terminated so capped and
    /// oscillating stops can be told apart from clean convergence.
    pub fn normalize_with_report(&self, root: ArcRexNode<T>) -> Result<Normalized<T>> {
        let mut session = RewriteSession::new(root.signature());
        let mut current = root;
        let mut passes = 0;
        let convergence = loop {
            session.fired_this_pass = 0;
            let next = self.rewrite_pass(&current, &mut session)?;
            passes += 1;
            if session.fired_this_pass == 0 || next == current {
                break Convergence::Stable;
            }
            let signature = next.signature();
            current = next;
            if session.seen_recently(signature) {
                warn!(
                    event = "oscillation_stop",
                    passes,
                    node = %current,
                    "rewrite rules are undoing each other; stopping early"
                );
                break Convergence::Oscillation;
            }
            session.record(signature);
            if passes >= self.iteration_cap {
                warn!(
                    event = "iteration_cap_stop",
                    passes,
                    node = %current,
                    "rewrite did not converge within the pass cap"
                );
                break Convergence::IterationCapped;
            }
        };
        debug!(
            event = "normalize_done",
            passes,
            rewrites = session.rewrites_fired,
            convergence = ?convergence,
        );
        Ok(Normalized {
            node: current,
            convergence,
            passes,
            rewrites_fired: session.rewrites_fired,
        })
    }

    /// One full post-order pass: operands first, then the rebuilt call is
    /// offered to the registry.
    fn rewrite_pass(
        &self,
        node: &ArcRexNode<T>,
        session: &mut RewriteSession,
    ) -> Result<ArcRexNode<T>> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW, || {
            if node.children.is_empty() {
                return self.dispatch(node, session);
            }
            let children = node
                .children
                .iter()
                .map(|child| self.rewrite_pass(child, session))
                .collect::<Result<Vec<_>>>()?;
            let rebuilt = if children
                .iter()
                .zip(node.children.iter())
                .all(|(new, old)| std::sync::Arc::ptr_eq(new, old))
            {
                node.clone()
            } else {
                std::sync::Arc::new(node.with_children(children))
            };
            self.dispatch(&rebuilt, session)
        })
    }

    /// Applies the first rule that rewrites `node`, or returns `node`
    /// unchanged. Leaves are never offered to rules.
    fn dispatch(
        &self,
        node: &ArcRexNode<T>,
        session: &mut RewriteSession,
    ) -> Result<ArcRexNode<T>> {
        if !node.typ.is_call() {
            return Ok(node.clone());
        }
        for rule in self.registry.candidates(&node.typ) {
            if !rule.matches(node) {
                continue;
            }
            let Some(rewritten) = rule.rewrite(&self.builder, node) else {
                continue;
            };
            ensure!(
                rewritten.ty == node.ty,
                "rule {} produced a type-incompatible rewrite: {} (type {:?}) from call {} (type {:?})",
                rule.name(),
                rewritten,
                rewritten.ty,
                node,
                node.ty,
            );
            if rewritten == *node {
                // The rule applied but concluded the input was already
                // optimal; indistinguishable from a decline by contract.
                continue;
            }
            trace!(
                event = "rewrite_fired",
                rule = rule.name(),
                from = %node,
                to = %rewritten,
            );
            session.fired_this_pass += 1;
            session.rewrites_fired += 1;
            return Ok(rewritten);
        }
        Ok(node.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::nodes::{RexNode, Value};
    use crate::rules::{RewriteRule, RuleMatcher};

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestTyp {
        Lit,
        Foo,
        Bar,
        Wrap,
    }

    impl std::fmt::Display for TestTyp {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl RexNodeTyp for TestTyp {
        type Ty = &'static str;

        fn is_call(&self) -> bool {
            !matches!(self, TestTyp::Lit)
        }
    }

    fn lit(v: i64) -> ArcRexNode<TestTyp> {
        Arc::new(RexNode {
            typ: TestTyp::Lit,
            children: vec![],
            data: Some(Value::Int64(v)),
            ty: "int",
        })
    }

    fn call(typ: TestTyp, children: Vec<ArcRexNode<TestTyp>>) -> ArcRexNode<TestTyp> {
        Arc::new(RexNode {
            typ,
            children,
            data: None,
            ty: "int",
        })
    }

    /// Rewrites calls of kind `from` into the same call of kind `to`.
    struct RenameRule {
        to: TestTyp,
        name: &'static str,
        matcher: RuleMatcher<TestTyp>,
    }

    impl RenameRule {
        fn new(from: TestTyp, to: TestTyp, name: &'static str) -> Self {
            Self {
                matcher: RuleMatcher::MatchOp { op: from },
                to,
                name,
            }
        }
    }

    impl RewriteRule<TestTyp> for RenameRule {
        fn matcher(&self) -> &RuleMatcher<TestTyp> {
            &self.matcher
        }

        fn rewrite(
            &self,
            builder: &RexBuilder<TestTyp>,
            call: &ArcRexNode<TestTyp>,
        ) -> Option<ArcRexNode<TestTyp>> {
            Some(builder.call(self.to.clone(), call.children.clone(), call.ty))
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    fn rewriter(rules: Vec<Arc<dyn RewriteRule<TestTyp>>>) -> FixpointRewriter<TestTyp> {
        FixpointRewriter::new(RuleRegistry::new_with_rules(rules))
    }

    #[test]
    fn empty_registry_is_identity() {
        let rewriter = rewriter(vec![]);
        let tree = call(TestTyp::Wrap, vec![call(TestTyp::Foo, vec![lit(1)])]);
        let report = rewriter.normalize_with_report(tree.clone()).unwrap();
        assert_eq!(report.node, tree);
        assert_eq!(report.convergence, Convergence::Stable);
        assert_eq!(report.rewrites_fired, 0);
        assert_eq!(report.passes, 1);
    }

    #[test]
    fn leaf_is_identity() {
        let rewriter = rewriter(vec![Arc::new(RenameRule::new(
            TestTyp::Foo,
            TestTyp::Bar,
            "foo_to_bar",
        ))]);
        let leaf = lit(42);
        assert_eq!(rewriter.normalize(leaf.clone()).unwrap(), leaf);
    }

    #[test]
    fn first_registered_rule_wins() {
        let rewriter = rewriter(vec![
            Arc::new(RenameRule::new(TestTyp::Foo, TestTyp::Bar, "a")),
            Arc::new(RenameRule::new(TestTyp::Foo, TestTyp::Wrap, "b")),
        ]);
        let out = rewriter.normalize(call(TestTyp::Foo, vec![lit(1)])).unwrap();
        assert_eq!(out.typ, TestTyp::Bar);
    }

    /// Wildcard rule that renames `Bar` calls to `Wrap` and declines on
    /// everything else at rewrite time.
    struct BarOnlyWildcard {
        matcher: RuleMatcher<TestTyp>,
    }

    impl BarOnlyWildcard {
        fn new() -> Self {
            Self {
                matcher: RuleMatcher::MatchAnyCall,
            }
        }
    }

    impl RewriteRule<TestTyp> for BarOnlyWildcard {
        fn matcher(&self) -> &RuleMatcher<TestTyp> {
            &self.matcher
        }

        fn rewrite(
            &self,
            builder: &RexBuilder<TestTyp>,
            call: &ArcRexNode<TestTyp>,
        ) -> Option<ArcRexNode<TestTyp>> {
            if call.typ != TestTyp::Bar {
                return None;
            }
            Some(builder.call(TestTyp::Wrap, call.children.clone(), call.ty))
        }

        fn name(&self) -> &'static str {
            "bar_only_wildcard"
        }
    }

    #[test]
    fn keyed_rules_run_before_wildcard() {
        let rewriter = rewriter(vec![
            Arc::new(BarOnlyWildcard::new()),
            Arc::new(RenameRule::new(TestTyp::Foo, TestTyp::Bar, "foo_to_bar")),
        ]);
        // Foo is renamed by the keyed rule, then the wildcard picks up the
        // resulting Bar on the next pass.
        let report = rewriter
            .normalize_with_report(call(TestTyp::Foo, vec![lit(1)]))
            .unwrap();
        assert_eq!(report.node.typ, TestTyp::Wrap);
        assert_eq!(report.convergence, Convergence::Stable);
        assert_eq!(report.rewrites_fired, 2);
    }

    #[test]
    fn idempotent_once_stable() {
        let rewriter = rewriter(vec![Arc::new(RenameRule::new(
            TestTyp::Foo,
            TestTyp::Bar,
            "foo_to_bar",
        ))]);
        let tree = call(TestTyp::Foo, vec![call(TestTyp::Foo, vec![lit(1)]), lit(2)]);
        let once = rewriter.normalize(tree).unwrap();
        let twice = rewriter.normalize(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn mutually_inverse_rules_stop_as_oscillation() {
        let rewriter = rewriter(vec![
            Arc::new(RenameRule::new(TestTyp::Foo, TestTyp::Bar, "foo_to_bar")),
            Arc::new(RenameRule::new(TestTyp::Bar, TestTyp::Foo, "bar_to_foo")),
        ]);
        let report = rewriter
            .normalize_with_report(call(TestTyp::Foo, vec![lit(1)]))
            .unwrap();
        assert_eq!(report.convergence, Convergence::Oscillation);
        // Detected as soon as a previous state recurs, well under the cap.
        assert_eq!(report.passes, 2);
        assert!(matches!(report.node.typ, TestTyp::Foo | TestTyp::Bar));
    }

    /// Grows the tree on every application; never reaches a fixed point and
    /// never revisits a state.
    struct GrowRule {
        matcher: RuleMatcher<TestTyp>,
    }

    impl GrowRule {
        fn new() -> Self {
            Self {
                matcher: RuleMatcher::MatchOp { op: TestTyp::Foo },
            }
        }
    }

    impl RewriteRule<TestTyp> for GrowRule {
        fn matcher(&self) -> &RuleMatcher<TestTyp> {
            &self.matcher
        }

        fn rewrite(
            &self,
            builder: &RexBuilder<TestTyp>,
            call: &ArcRexNode<TestTyp>,
        ) -> Option<ArcRexNode<TestTyp>> {
            let wrapped = builder.call(TestTyp::Wrap, call.children.clone(), call.ty);
            Some(builder.call(TestTyp::Foo, vec![wrapped], call.ty))
        }

        fn name(&self) -> &'static str {
            "grow"
        }
    }

    #[test]
    fn runaway_rule_hits_iteration_cap() {
        let rewriter = rewriter(vec![Arc::new(GrowRule::new())]).with_iteration_cap(4);
        let report = rewriter
            .normalize_with_report(call(TestTyp::Foo, vec![lit(1)]))
            .unwrap();
        assert_eq!(report.convergence, Convergence::IterationCapped);
        assert_eq!(report.passes, 4);
    }

    /// Deliberately changes the node's result type.
    struct IllTypedRule {
        matcher: RuleMatcher<TestTyp>,
    }

    impl IllTypedRule {
        fn new() -> Self {
            Self {
                matcher: RuleMatcher::MatchOp { op: TestTyp::Foo },
            }
        }
    }

    impl RewriteRule<TestTyp> for IllTypedRule {
        fn matcher(&self) -> &RuleMatcher<TestTyp> {
            &self.matcher
        }

        fn rewrite(
            &self,
            builder: &RexBuilder<TestTyp>,
            call: &ArcRexNode<TestTyp>,
        ) -> Option<ArcRexNode<TestTyp>> {
            Some(builder.call(TestTyp::Bar, call.children.clone(), "bool"))
        }

        fn name(&self) -> &'static str {
            "ill_typed"
        }
    }

    #[test]
    fn ill_typed_rewrite_fails_fast() {
        let rewriter = rewriter(vec![Arc::new(IllTypedRule::new())]);
        let err = rewriter
            .normalize(call(TestTyp::Foo, vec![lit(1)]))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ill_typed"), "{}", message);
        assert!(message.contains("type-incompatible"), "{}", message);
    }

    /// Returns the input unchanged from `rewrite`; must read as a decline.
    struct NoopSomeRule {
        matcher: RuleMatcher<TestTyp>,
    }

    impl RewriteRule<TestTyp> for NoopSomeRule {
        fn matcher(&self) -> &RuleMatcher<TestTyp> {
            &self.matcher
        }

        fn rewrite(
            &self,
            _builder: &RexBuilder<TestTyp>,
            call: &ArcRexNode<TestTyp>,
        ) -> Option<ArcRexNode<TestTyp>> {
            Some(call.clone())
        }

        fn name(&self) -> &'static str {
            "noop_some"
        }
    }

    #[test]
    fn returning_the_original_counts_as_decline() {
        let rewriter = rewriter(vec![Arc::new(NoopSomeRule {
            matcher: RuleMatcher::MatchAnyCall,
        })]);
        let tree = call(TestTyp::Foo, vec![lit(1)]);
        let report = rewriter.normalize_with_report(tree.clone()).unwrap();
        assert_eq!(report.node, tree);
        assert_eq!(report.convergence, Convergence::Stable);
        assert_eq!(report.rewrites_fired, 0);
    }
}
