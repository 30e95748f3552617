use optimize_core::types::{Conditional, ConditionalType, DataType};
use tracing::{debug, warn};

use crate::context::PageContext;
use crate::operators::{compare_list, compare_object_field, compare_string};

/// Evaluates targeting conditionals against a page context.
///
/// Evaluation is side-effect free and never fails: unreadable storage and
/// unparseable values evaluate to `false`.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator;

impl RuleEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, conditional: &Conditional, ctx: &PageContext) -> bool {
        let matched = match conditional.kind {
            ConditionalType::UrlParameter => self.evaluate_url_parameter(conditional, ctx),
            ConditionalType::LocalStorage | ConditionalType::SessionStorage => {
                self.evaluate_storage(conditional, ctx)
            }
        };

        debug!(
            kind = ?conditional.kind,
            key = %conditional.conditional_key,
            operator = ?conditional.operator,
            value = %conditional.value,
            matched,
            "conditional evaluated"
        );
        matched
    }

    /// First conditional in declaration order that holds.
    pub fn first_match<'a>(
        &self,
        conditionals: &'a [Conditional],
        ctx: &PageContext,
    ) -> Option<&'a Conditional> {
        conditionals.iter().find(|c| self.evaluate(c, ctx))
    }

    // URL parameters are always compared as strings.
    fn evaluate_url_parameter(&self, conditional: &Conditional, ctx: &PageContext) -> bool {
        let actual = ctx.query_param(&conditional.conditional_key);
        compare_string(actual, conditional.operator, &conditional.value)
    }

    fn evaluate_storage(&self, conditional: &Conditional, ctx: &PageContext) -> bool {
        let Some(storage) = ctx.storage_for(conditional.kind) else {
            return false;
        };

        let stored = match storage.get(&conditional.name_in_storage) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    name_in_storage = %conditional.name_in_storage,
                    error = %e,
                    "storage unreadable, conditional does not match"
                );
                return false;
            }
        };

        let actual = stored.as_deref();
        match conditional.data_type {
            DataType::String => compare_string(actual, conditional.operator, &conditional.value),
            DataType::CommaSeparated => {
                compare_list(actual, conditional.operator, &conditional.value)
            }
            DataType::Object => compare_object_field(
                actual,
                &conditional.conditional_key,
                conditional.operator,
                &conditional.value,
            ),
        }
    }
}
