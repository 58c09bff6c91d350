use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Rolling concentration series, capped at `max_length` samples.
///
/// Entities that appear mid-run have shorter series than the time axis. Their
/// samples are aligned to the most recent end; see [`History::aligned`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    max_length: usize,
    pub time: VecDeque<f64>,
    pub molecules: BTreeMap<String, VecDeque<f64>>,
    pub enzymes: BTreeMap<String, VecDeque<f64>>,
}

impl History {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
            time: VecDeque::new(),
            molecules: BTreeMap::new(),
            enzymes: BTreeMap::new(),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn record<'a, M, E>(&mut self, time: f64, molecules: M, enzymes: E)
    where
        M: IntoIterator<Item = (&'a String, f64)>,
        E: IntoIterator<Item = (&'a String, f64)>,
    {
        let cap = self.max_length;
        push_bounded(&mut self.time, time, cap);
        for (name, value) in molecules {
            push_bounded(self.molecules.entry(name.clone()).or_default(), value, cap);
        }
        for (id, value) in enzymes {
            push_bounded(self.enzymes.entry(id.clone()).or_default(), value, cap);
        }
    }

    /// Drops the series of an enzyme that no longer exists.
    pub fn forget_enzyme(&mut self, enzyme_id: &str) {
        self.enzymes.remove(enzyme_id);
    }

    /// Value of `series` at row `row` of the time axis, or `None` if the series had
    /// not started yet.
    pub fn aligned(&self, series: &VecDeque<f64>, row: usize) -> Option<f64> {
        let offset = self.time.len().checked_sub(series.len())?;
        row.checked_sub(offset).and_then(|i| series.get(i).copied())
    }

    pub fn clear(&mut self) {
        self.time.clear();
        self.molecules.clear();
        self.enzymes.clear();
    }
}

fn push_bounded(series: &mut VecDeque<f64>, value: f64, cap: usize) {
    series.push_back(value);
    while series.len() > cap {
        series.pop_front();
    }
}
