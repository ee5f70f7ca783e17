//! Dream builder scoring arithmetic.
//!
//! The widget submits one score row per cluster (a 1..10 score per statement
//! in that cluster). Scores are clamped, averaged per cluster, and the
//! highest-scoring clusters become the direction input for the forced
//! formulation call.

use serde_json::Value;

use crate::specialists::output::Cluster;

/// One scored cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterScore {
    pub theme: String,
    pub average: f64,
}

/// Reads score rows from a JSON value (the `__pending_scores` transient or a
/// `{"action":"submit_scores","scores":[...]}` message body). Non-numeric
/// entries become 0 and are ignored by the averaging.
pub fn parse_score_rows(value: &Value) -> Option<Vec<Vec<f64>>> {
    let rows = value.as_array()?;
    Some(
        rows.iter()
            .map(|row| match row {
                Value::Array(nums) => nums
                    .iter()
                    .map(|n| n.as_f64().unwrap_or(0.0))
                    .collect(),
                _ => Vec::new(),
            })
            .collect(),
    )
}

/// Score rows embedded in a chat message.
pub fn scores_from_message(message: &str) -> Option<Vec<Vec<f64>>> {
    let parsed: Value = serde_json::from_str(message.trim()).ok()?;
    if parsed.get("action").and_then(Value::as_str) != Some("submit_scores") {
        return None;
    }
    parse_score_rows(parsed.get("scores")?)
}

/// Average score per cluster. Each entry is clamped to 1..10; entries that
/// are not positive numbers are dropped. A cluster without a usable score
/// averages 0. Unnamed clusters get a positional fallback theme.
pub fn cluster_averages(clusters: &[Cluster], rows: &[Vec<f64>]) -> Vec<ClusterScore> {
    clusters
        .iter()
        .enumerate()
        .map(|(i, cluster)| {
            let scores: Vec<f64> = rows
                .get(i)
                .map(|row| {
                    row.iter()
                        .filter(|n| n.is_finite() && **n > 0.0)
                        .map(|n| n.clamp(1.0, 10.0))
                        .collect()
                })
                .unwrap_or_default();
            let average = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };
            let theme = {
                let theme = cluster.theme.trim();
                if theme.is_empty() {
                    format!("Category {}", i + 1)
                } else {
                    theme.to_string()
                }
            };
            ClusterScore { theme, average }
        })
        .collect()
}

/// All clusters sharing the maximum positive average.
pub fn top_clusters(scores: &[ClusterScore]) -> Vec<ClusterScore> {
    let max = scores.iter().map(|s| s.average).fold(0.0, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }
    scores
        .iter()
        .filter(|s| s.average == max)
        .cloned()
        .collect()
}

/// Wire rendering of top clusters for the direction prompt.
pub fn top_clusters_json(scores: &[ClusterScore]) -> String {
    let items: Vec<Value> = scores
        .iter()
        .map(|s| {
            serde_json::json!({
                "theme": s.theme,
                "average": (s.average * 100.0).round() / 100.0,
            })
        })
        .collect();
    Value::Array(items).to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn cluster(theme: &str) -> Cluster {
        Cluster {
            theme: theme.to_string(),
            statement_indices: Vec::new(),
        }
    }

    #[test]
    fn rows_parse_from_transient_and_message() {
        let rows = parse_score_rows(&json!([[7, 9], [3], "bad"])).unwrap();
        assert_eq!(rows, vec![vec![7.0, 9.0], vec![3.0], vec![]]);
        assert!(parse_score_rows(&json!("nope")).is_none());

        let rows =
            scores_from_message(r#"{"action": "submit_scores", "scores": [[8, 2]]}"#).unwrap();
        assert_eq!(rows, vec![vec![8.0, 2.0]]);
        assert!(scores_from_message(r#"{"action": "other", "scores": [[1]]}"#).is_none());
        assert!(scores_from_message("free text").is_none());
    }

    #[test]
    fn averages_clamp_and_skip_non_positive() {
        let clusters = vec![cluster("Impact"), cluster(""), cluster("Growth")];
        let rows = vec![vec![12.0, 8.0], vec![0.0, -3.0], vec![5.0]];
        let scores = cluster_averages(&clusters, &rows);
        assert_eq!(scores[0].average, 9.0); // 12 clamps to 10
        assert_eq!(scores[1].theme, "Category 2");
        assert_eq!(scores[1].average, 0.0);
        assert_eq!(scores[2].average, 5.0);
    }

    #[test]
    fn missing_row_averages_zero() {
        let clusters = vec![cluster("A"), cluster("B")];
        let scores = cluster_averages(&clusters, &[vec![6.0]]);
        assert_eq!(scores[1].average, 0.0);
    }

    #[test]
    fn top_clusters_keep_ties_and_require_a_positive_max() {
        let scores = vec![
            ClusterScore {
                theme: "A".to_string(),
                average: 7.0,
            },
            ClusterScore {
                theme: "B".to_string(),
                average: 7.0,
            },
            ClusterScore {
                theme: "C".to_string(),
                average: 3.0,
            },
        ];
        let top = top_clusters(&scores);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|s| s.average == 7.0));

        let none = top_clusters(&[ClusterScore {
            theme: "A".to_string(),
            average: 0.0,
        }]);
        assert!(none.is_empty());
    }

    #[test]
    fn top_clusters_render_compact_json() {
        let rendered = top_clusters_json(&[ClusterScore {
            theme: "Impact".to_string(),
            average: 7.333333,
        }]);
        assert_eq!(rendered, r#"[{"average":7.33,"theme":"Impact"}]"#);
    }
}
