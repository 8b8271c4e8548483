// Copyright (c) 2026 Nexus Labs
// SPDX-License-Identifier: AGPL-3.0
//! # Fast-Path Route Signatures
//!
//! The route cache keys on task *patterns*, not task ids, so repeated
//! delegations of similar work skip consensus voting. The signature is a
//! pure function of the operating mode and the first few significant
//! keywords of the task description.

use crate::domain::config::OperatingMode;

/// Keywords shorter than this carry no routing signal.
const MIN_KEYWORD_LEN: usize = 3;

/// Number of significant keywords folded into the signature.
const SIGNATURE_KEYWORDS: usize = 3;

/// Common words filtered out of task descriptions before keying.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "into", "are", "was",
    "has", "have", "not", "you", "all", "can", "our", "its", "per", "via",
];

/// Deterministic cache key for a task pattern under an operating mode.
///
/// Side-effect free: lowercases the description, strips punctuation, drops
/// stop words and short words, then joins the first three remaining keywords.
pub fn route_signature(mode: OperatingMode, description: &str) -> String {
    let keywords: Vec<String> = description
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| word.len() >= MIN_KEYWORD_LEN && !STOP_WORDS.contains(&word.as_str()))
        .take(SIGNATURE_KEYWORDS)
        .collect();

    format!("mode-{}|{}", mode, keywords.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_filters_stop_and_short_words() {
        let sig = route_signature(OperatingMode::Default, "fix the slow login bug");
        assert_eq!(sig, "mode-default|fix-slow-login");
    }

    #[test]
    fn test_signature_matches_task_patterns_not_ids() {
        let a = route_signature(OperatingMode::Default, "Fix the slow login bug!");
        let b = route_signature(OperatingMode::Default, "fix slow login (again)");
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_is_mode_aware() {
        let default_mode = route_signature(OperatingMode::Default, "fix the slow login bug");
        let local_only = route_signature(OperatingMode::LocalOnly, "fix the slow login bug");
        assert_ne!(default_mode, local_only);
    }

    #[test]
    fn test_signature_of_noise_only_description() {
        let sig = route_signature(OperatingMode::Default, "do it on an as is");
        assert_eq!(sig, "mode-default|");
    }
}
