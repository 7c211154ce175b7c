use std::sync::Arc;

use rexd_core::registry::RuleRegistry;
use rexd_core::rewriter::FixpointRewriter;
use rexd_core::rules::RewriteRule;

use crate::rex_nodes::SqlRexType;

/// Create a rewriter wired with a single rule, for rule unit tests.
pub fn new_test_rewriter(rule: Arc<dyn RewriteRule<SqlRexType>>) -> FixpointRewriter<SqlRexType> {
    new_test_rewriter_with_rules(vec![rule])
}

pub fn new_test_rewriter_with_rules(
    rules: Vec<Arc<dyn RewriteRule<SqlRexType>>>,
) -> FixpointRewriter<SqlRexType> {
    FixpointRewriter::new(RuleRegistry::new_with_rules(rules))
}

/// Route rewrite traces to the test output when a test needs them.
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
