//! Ranking of accepted pairs by p-value.

use crate::recording::RankingRecord;

/// Orders pairs by ascending p-value and keeps the best `top_n`.
#[derive(Debug, Clone, Copy)]
pub struct PairRanker {
    top_n: usize,
}

impl PairRanker {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Stable sort: equal p-values keep their evaluation order.
    pub fn rank(&self, mut records: Vec<RankingRecord>) -> Vec<RankingRecord> {
        records.sort_by(|a, b| a.adf_pvalue.total_cmp(&b.adf_pvalue));
        records.truncate(self.top_n);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pair: &str, p: f64) -> RankingRecord {
        RankingRecord {
            pair: pair.to_string(),
            adf_pvalue: p,
        }
    }

    #[test]
    fn test_rank_sorts_and_truncates() {
        let ranked = PairRanker::new(3).rank(vec![
            record("A-B", 0.04),
            record("A-C", 0.001),
            record("B-C", 0.02),
            record("B-D", 0.02),
            record("C-D", 0.03),
        ]);
        let pairs: Vec<&str> = ranked.iter().map(|r| r.pair.as_str()).collect();
        assert_eq!(pairs, vec!["A-C", "B-C", "B-D"]);
    }

    #[test]
    fn test_rank_empty() {
        assert!(PairRanker::new(5).rank(Vec::new()).is_empty());
    }
}
