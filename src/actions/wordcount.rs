//! Word Count Workload
//!
//! The classic MapReduce pairing: the map action counts words in a text
//! blob, the reduce action merges partial counts. Blobs are JSON on both
//! sides so the controller and other workers can consume them directly.

use anyhow::{Context, Result};
use std::collections::HashMap;

/// Map action: splits a UTF-8 text blob on non-alphabetic characters,
/// lowercases the words and emits a JSON object of per-word counts.
pub async fn count_words(_partitions: u32, input: Vec<u8>) -> Result<Vec<u8>> {
    let text = String::from_utf8(input).context("word count input is not UTF-8")?;

    let mut counts: HashMap<String, u64> = HashMap::new();
    for word in text
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
    {
        *counts.entry(word.to_lowercase()).or_insert(0) += 1;
    }

    Ok(serde_json::to_vec(&counts)?)
}

/// Reduce action: merges a JSON array of per-word count objects by summing.
/// Also serves as the combine action, since combining is just an early
/// reduce over one worker's partial counts.
pub async fn sum_counts(_partitions: u32, input: Vec<u8>) -> Result<Vec<u8>> {
    let partials: Vec<HashMap<String, u64>> =
        serde_json::from_slice(&input).context("count merge input is not a JSON array of count maps")?;

    let mut merged: HashMap<String, u64> = HashMap::new();
    for partial in partials {
        for (word, count) in partial {
            *merged.entry(word).or_insert(0) += count;
        }
    }

    Ok(serde_json::to_vec(&merged)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_count_words_counts_and_lowercases() {
        let output = count_words(1, b"The cat saw the Cat".to_vec()).await.unwrap();
        let counts: HashMap<String, u64> = serde_json::from_slice(&output).unwrap();

        assert_eq!(counts["the"], 2);
        assert_eq!(counts["cat"], 2);
        assert_eq!(counts["saw"], 1);
    }

    #[tokio::test]
    async fn test_count_words_rejects_non_utf8() {
        let result = count_words(1, vec![0xff, 0xfe]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sum_counts_merges_partials() {
        let partials = serde_json::json!([
            {"cat": 2, "dog": 1},
            {"cat": 1, "bird": 4},
        ]);
        let input = serde_json::to_vec(&partials).unwrap();

        let output = sum_counts(1, input).await.unwrap();
        let merged: HashMap<String, u64> = serde_json::from_slice(&output).unwrap();

        assert_eq!(merged["cat"], 3);
        assert_eq!(merged["dog"], 1);
        assert_eq!(merged["bird"], 4);
    }
}
