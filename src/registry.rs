//! Named intermediate tables shared between the decomposition stages.
//!
//! Every stage publishes its results under the classical table names (B1,
//! C20, D10, ...). The registry is append-only: a table, once stored, is
//! never replaced, so downstream stages can rely on what they read.

use crate::error::{Result, X11Error};
use crate::timeseries::TimeSeries;
use std::collections::BTreeMap;
use std::fmt;

/// Decomposition stage owning a group of tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    A,
    B,
    C,
    D,
    E,
    /// Reserved; publishes no tables.
    F,
}

/// Identifier of one intermediate or published table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)] // D10a follows the published table naming
pub enum TableId {
    /// Original series on its own domain.
    A1,
    /// Forecast extension appended by the preprocessor.
    A1a,
    /// Backcast extension prepended by the preprocessor.
    A1b,

    /// Working series, extended by the preprocessor horizons.
    B1,
    /// First rough trend (2xN probe).
    B2,
    /// First seasonal-irregular component.
    B3,
    /// Replacement values for the extreme SI observations.
    B4,
    /// First seasonal estimate, normalized.
    B5,
    /// First seasonally adjusted series.
    B6,
    /// First Henderson trend.
    B7,
    /// Second seasonal-irregular component.
    B8,
    /// Extreme-corrected SI.
    B9,
    /// Second seasonal estimate, normalized.
    B10,
    /// Second seasonally adjusted series.
    B11,
    /// First irregular component.
    B13,
    /// First-pass observation weights.
    B17,
    /// First-pass extreme correction factors.
    B20,

    /// Series corrected with the B-stage factors.
    C1,
    /// Rough trend of the corrected series.
    C2,
    /// Seasonal-irregular of the corrected series.
    C4,
    /// Refined seasonal estimate, normalized.
    C5,
    /// Refined seasonally adjusted series.
    C6,
    /// Refined Henderson trend.
    C7,
    /// Second-round seasonal-irregular.
    C9,
    /// Second-round seasonal estimate, normalized.
    C10,
    /// Second-round seasonally adjusted series.
    C11,
    /// Refined irregular component.
    C13,
    /// Refined observation weights.
    C17,
    /// Refined extreme correction factors.
    C20,

    /// Series corrected with the C-stage factors.
    D1,
    /// Rough trend of the final pass.
    D2,
    /// Seasonal-irregular of the final pass.
    D4,
    /// Preliminary final seasonal estimate.
    D5,
    /// Preliminary final adjusted series.
    D6,
    /// Preliminary final Henderson trend.
    D7,
    /// Final seasonal-irregular component.
    D8,
    /// Extreme-corrected final SI.
    D9,
    /// Final seasonal factors.
    D10,
    /// One-year-ahead seasonal factor forecast.
    D10a,
    /// Final seasonally adjusted series.
    D11,
    /// Final trend-cycle.
    D12,
    /// Final irregular component.
    D13,

    /// Series with extreme observations replaced.
    E1,
    /// Modified seasonally adjusted series.
    E2,
    /// Modified irregular component.
    E3,
}

impl TableId {
    /// Stage that publishes this table.
    pub fn stage(self) -> Stage {
        use TableId::*;
        match self {
            A1 | A1a | A1b => Stage::A,
            B1 | B2 | B3 | B4 | B5 | B6 | B7 | B8 | B9 | B10 | B11 | B13 | B17 | B20 => Stage::B,
            C1 | C2 | C4 | C5 | C6 | C7 | C9 | C10 | C11 | C13 | C17 | C20 => Stage::C,
            D1 | D2 | D4 | D5 | D6 | D7 | D8 | D9 | D10 | D10a | D11 | D12 | D13 => Stage::D,
            E1 | E2 | E3 => Stage::E,
        }
    }

    /// Published table name.
    pub fn name(self) -> &'static str {
        use TableId::*;
        match self {
            A1 => "A1",
            A1a => "A1a",
            A1b => "A1b",
            B1 => "B1",
            B2 => "B2",
            B3 => "B3",
            B4 => "B4",
            B5 => "B5",
            B6 => "B6",
            B7 => "B7",
            B8 => "B8",
            B9 => "B9",
            B10 => "B10",
            B11 => "B11",
            B13 => "B13",
            B17 => "B17",
            B20 => "B20",
            C1 => "C1",
            C2 => "C2",
            C4 => "C4",
            C5 => "C5",
            C6 => "C6",
            C7 => "C7",
            C9 => "C9",
            C10 => "C10",
            C11 => "C11",
            C13 => "C13",
            C17 => "C17",
            C20 => "C20",
            D1 => "D1",
            D2 => "D2",
            D4 => "D4",
            D5 => "D5",
            D6 => "D6",
            D7 => "D7",
            D8 => "D8",
            D9 => "D9",
            D10 => "D10",
            D10a => "D10a",
            D11 => "D11",
            D12 => "D12",
            D13 => "D13",
            E1 => "E1",
            E2 => "E2",
            E3 => "E3",
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Append-only store of named tables.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tables: BTreeMap<TableId, TimeSeries>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a table. Overwriting an existing table is a programming error:
    /// stages only ever publish their own tables, once.
    pub fn insert(&mut self, id: TableId, series: TimeSeries) {
        let previous = self.tables.insert(id, series);
        assert!(previous.is_none(), "table {} published twice", id);
    }

    /// Look a table up.
    pub fn get(&self, id: TableId) -> Option<&TimeSeries> {
        self.tables.get(&id)
    }

    /// Look a table up, treating absence as an error.
    pub fn require(&self, id: TableId) -> Result<&TimeSeries> {
        self.tables.get(&id).ok_or(X11Error::MissingTable(id))
    }

    pub fn contains(&self, id: TableId) -> bool {
        self.tables.contains_key(&id)
    }

    /// Identifiers of all published tables, in table order.
    pub fn ids(&self) -> impl Iterator<Item = TableId> + '_ {
        self.tables.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
