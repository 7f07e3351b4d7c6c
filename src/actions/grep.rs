//! Line Grep Workload
//!
//! Map action that filters the lines of a text for a substring pattern.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct GrepInput {
    pub pattern: String,
    pub text: String,
}

/// Map action: input is a JSON `{pattern, text}` object, output is a JSON
/// array of the lines containing the pattern.
pub async fn grep_lines(_partitions: u32, input: Vec<u8>) -> Result<Vec<u8>> {
    let request: GrepInput =
        serde_json::from_slice(&input).context("grep input is not a JSON pattern/text object")?;

    let matches: Vec<&str> = request
        .text
        .lines()
        .filter(|line| line.contains(&request.pattern))
        .collect();

    Ok(serde_json::to_vec(&matches)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_grep_lines_keeps_matching_lines_only() {
        let input = serde_json::to_vec(&GrepInput {
            pattern: "err".to_string(),
            text: "ok line\nerror here\nanother\nerrand".to_string(),
        })
        .unwrap();

        let output = grep_lines(1, input).await.unwrap();
        let matches: Vec<String> = serde_json::from_slice(&output).unwrap();

        assert_eq!(matches, vec!["error here", "errand"]);
    }
}
