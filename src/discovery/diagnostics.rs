//! Per-item skip reasons collected during a run.

use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Pipeline step that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Filter,
    Cointegration,
    Persist,
    Ranking,
    Backtest,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Filter => "filter",
            Stage::Cointegration => "cointegration",
            Stage::Persist => "persist",
            Stage::Ranking => "ranking",
            Stage::Backtest => "backtest",
        };
        f.write_str(name)
    }
}

/// Why an instrument or pair was left out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Instrument id or pair id ("A-B")
    pub subject: String,
    pub stage: Stage,
    pub reason: String,
}

/// Ordered list of diagnostics. Recording one also logs it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subject: impl Into<String>, stage: Stage, reason: impl fmt::Display) {
        let entry = Diagnostic {
            subject: subject.into(),
            stage,
            reason: reason.to_string(),
        };
        warn!(
            subject = %entry.subject,
            stage = %entry.stage,
            reason = %entry.reason,
            "Skipped"
        );
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostics recorded for `subject`, in order
    pub fn for_subject<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.subject == subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_lookup() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push("BTC", Stage::Load, "file truncated");
        diagnostics.push("BTC-ETH", Stage::Cointegration, "singular design matrix");

        assert_eq!(diagnostics.len(), 2);
        let btc: Vec<_> = diagnostics.for_subject("BTC").collect();
        assert_eq!(btc.len(), 1);
        assert_eq!(btc[0].stage, Stage::Load);
        assert_eq!(Stage::Cointegration.to_string(), "cointegration");
    }
}
