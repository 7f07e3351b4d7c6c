//! Built-In Worker Actions
//!
//! Concrete map/reduce workloads bundled with the worker binary. The
//! controller normally pushes its own action bundles; these built-ins cover
//! standalone runs and serve as realistic fixtures for the processor.

pub mod grep;
pub mod wordcount;

use crate::processor::registry::{action_fn, ActionFn};
use std::collections::HashMap;

/// Ready-to-install map half: `wordcount` and `grep`.
pub fn builtin_map_actions() -> HashMap<String, ActionFn> {
    let mut actions = HashMap::new();
    actions.insert("wordcount".to_string(), action_fn(wordcount::count_words));
    actions.insert("grep".to_string(), action_fn(grep::grep_lines));
    actions
}

/// Ready-to-install reduce half: `sum_counts` (used for combine too).
pub fn builtin_reduce_actions() -> HashMap<String, ActionFn> {
    let mut actions = HashMap::new();
    actions.insert("sum_counts".to_string(), action_fn(wordcount::sum_counts));
    actions
}
