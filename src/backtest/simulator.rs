//! Bar-by-bar spread trading state machine.
//!
//! # Rules
//! - `Flat`: z > entry opens a short spread, z < -entry opens a long spread
//! - `ShortSpread`: z <= exit closes, PnL = entry spread - current spread
//! - `LongSpread`: z >= exit closes, PnL = current spread - entry spread
//! - An undefined z-score never opens or closes a position
//! - A position still open at the last bar is closed at that bar's spread
//!
//! The transition function [`step`] is pure; [`TradeSimulator::run`] folds it
//! over a window and keeps the running equity.

use crate::types::SpreadPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Direction of a spread position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    /// Long B, short β·A
    Long,
    /// Short B, long β·A
    Short,
}

impl PositionSide {
    /// +1 for long spread, -1 for short spread
    pub fn sign(self) -> i8 {
        match self {
            PositionSide::Long => 1,
            PositionSide::Short => -1,
        }
    }
}

/// Entry details carried while a position is open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub time: DateTime<Utc>,
    pub spread: f64,
    pub zscore: f64,
}

/// Simulator state. At most one position is open at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    Flat,
    LongSpread(Entry),
    ShortSpread(Entry),
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "Flat"),
            PositionState::LongSpread(_) => write!(f, "LongSpread"),
            PositionState::ShortSpread(_) => write!(f, "ShortSpread"),
        }
    }
}

/// Entry/exit z-score thresholds. `entry` must be positive and above `exit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub entry: f64,
    pub exit: f64,
}

/// One completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub side: PositionSide,
    pub entry_z: f64,
    /// `None` when a forced close lands on a bar without a z-score
    pub exit_z: Option<f64>,
    pub pnl: f64,
    pub duration_h: f64,
}

/// Cumulative realised PnL after each closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: DateTime<Utc>,
    pub equity: f64,
}

/// Equity curve starting at zero before the first trade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquityCurve {
    pub points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.equity)
    }
}

/// Ledger and equity curve for one simulated window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationResult {
    pub trades: Vec<Trade>,
    pub equity: EquityCurve,
}

/// Advance the state machine by one bar.
///
/// Entry and exit are checked in separate states, so a position is never
/// closed on the bar that opened it.
pub fn step(
    state: PositionState,
    bar: &SpreadPoint,
    thresholds: &Thresholds,
) -> (PositionState, Option<Trade>) {
    let Some(z) = bar.zscore.filter(|z| z.is_finite()) else {
        return (state, None);
    };

    match state {
        PositionState::Flat => {
            let entry = Entry {
                time: bar.time,
                spread: bar.spread,
                zscore: z,
            };
            if z > thresholds.entry {
                (PositionState::ShortSpread(entry), None)
            } else if z < -thresholds.entry {
                (PositionState::LongSpread(entry), None)
            } else {
                (PositionState::Flat, None)
            }
        }
        PositionState::ShortSpread(entry) if z <= thresholds.exit => (
            PositionState::Flat,
            Some(close(&entry, PositionSide::Short, bar)),
        ),
        PositionState::LongSpread(entry) if z >= thresholds.exit => (
            PositionState::Flat,
            Some(close(&entry, PositionSide::Long, bar)),
        ),
        open => (open, None),
    }
}

/// Close any open position at `bar` regardless of its z-score.
pub fn force_close(state: PositionState, bar: &SpreadPoint) -> Option<Trade> {
    match state {
        PositionState::Flat => None,
        PositionState::LongSpread(entry) => Some(close(&entry, PositionSide::Long, bar)),
        PositionState::ShortSpread(entry) => Some(close(&entry, PositionSide::Short, bar)),
    }
}

fn close(entry: &Entry, side: PositionSide, bar: &SpreadPoint) -> Trade {
    let pnl = match side {
        PositionSide::Long => bar.spread - entry.spread,
        PositionSide::Short => entry.spread - bar.spread,
    };
    Trade {
        entry_time: entry.time,
        exit_time: bar.time,
        side,
        entry_z: entry.zscore,
        exit_z: bar.zscore,
        pnl,
        duration_h: (bar.time - entry.time).num_milliseconds() as f64 / MILLIS_PER_HOUR,
    }
}

/// Runs the state machine over a spread/z-score window.
#[derive(Debug, Clone, Copy)]
pub struct TradeSimulator {
    thresholds: Thresholds,
}

impl TradeSimulator {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Simulate `bars` in order.
    ///
    /// The equity curve starts with a zero point stamped at the first bar and
    /// gains one point per closed trade, stamped at its exit time. An empty
    /// window yields an empty result.
    pub fn run(&self, bars: &[SpreadPoint]) -> SimulationResult {
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return SimulationResult::default();
        };

        let mut trades = Vec::new();
        let mut cumulative = 0.0;
        let mut equity = EquityCurve {
            points: vec![EquityPoint {
                time: first.time,
                equity: 0.0,
            }],
        };
        let mut record = |trade: Trade, trades: &mut Vec<Trade>| {
            cumulative += trade.pnl;
            equity.points.push(EquityPoint {
                time: trade.exit_time,
                equity: cumulative,
            });
            trades.push(trade);
        };

        let mut state = PositionState::Flat;
        for bar in bars {
            let (next, closed) = step(state, bar, &self.thresholds);
            if let Some(trade) = closed {
                record(trade, &mut trades);
            }
            state = next;
        }

        if let Some(trade) = force_close(state, last) {
            record(trade, &mut trades);
        }

        SimulationResult { trades, equity }
    }
}
