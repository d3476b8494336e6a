// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use uuid::Uuid;

use crate::domain::completion::{unix_now, Choice, CompletionResponse, Usage, TEXT_COMPLETION_OBJECT};

/// Sum usage over the choices that reported it
pub fn total_usage(choices: &[Choice]) -> Usage {
    choices.iter().filter_map(Choice::usage).sum()
}

/// Wrap ordered choices in a response envelope
pub fn aggregate(choices: Vec<Choice>) -> CompletionResponse {
    CompletionResponse {
        id: Uuid::new_v4().to_string(),
        object: TEXT_COMPLETION_OBJECT.to_string(),
        created: unix_now(),
        usage: total_usage(&choices),
        choices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::completion::ProviderCompletion;

    #[test]
    fn sums_usage_and_skips_errors() {
        let choices = vec![
            Choice::completed("a/x", ProviderCompletion::new("one").with_usage(Usage::new(1, 2, 3))),
            Choice::completed("a/x", ProviderCompletion::new("two").with_usage(Usage::new(4, 5, 9))),
            Choice::failed("missing", "Error: boom"),
        ];

        let response = aggregate(choices);
        assert_eq!(response.usage, Usage::new(5, 7, 12));
        assert_eq!(response.object, "text_completion");
        assert_eq!(response.choices.len(), 3);
        assert_eq!(response.choices[2].error(), Some("Error: boom"));
    }

    #[test]
    fn empty_batch_has_zero_usage() {
        let response = aggregate(Vec::new());
        assert!(response.choices.is_empty());
        assert_eq!(response.usage, Usage::default());
    }

    #[test]
    fn completion_without_usage_contributes_nothing() {
        let choices = vec![Choice::completed("a/x", ProviderCompletion::new("text"))];
        assert_eq!(total_usage(&choices), Usage::new(0, 0, 0));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(aggregate(Vec::new()).id, aggregate(Vec::new()).id);
    }
}
