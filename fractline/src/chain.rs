//! Append-only history of detected fractals.
//!
//! Nodes live in an index-addressed arena; `Fractal::previous` stores the arena
//! position of the node appended before it. The chain has a single writer (its
//! detector) and hands out shared references only.

use polars::df;
use polars::prelude::DataFrame;

use crate::constant::{FractalKind, Side};
use crate::error::DataError;
use crate::fractal::{Fractal, FractalId};

#[derive(Debug, Clone, Default)]
pub struct FractalChain {
    rows: Vec<Fractal>,
}

impl FractalChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `fractal` behind the current head and makes it the new head.
    ///
    /// Callers append in non-decreasing bar index order. A bar confirmed as both
    /// a low and a high fractal is appended twice with the same index.
    pub fn append(&mut self, mut fractal: Fractal) -> FractalId {
        debug_assert!(
            self.rows.last().is_none_or(|head| head.index <= fractal.index),
            "fractals must be appended in bar order"
        );
        fractal.previous = self.head_id();
        self.rows.push(fractal);
        FractalId(self.rows.len() - 1)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: FractalId) -> Option<&Fractal> {
        self.rows.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FractalId, &Fractal)> {
        self.rows
            .iter()
            .enumerate()
            .map(|(pos, fractal)| (FractalId(pos), fractal))
    }

    pub fn last_n(&self, n: usize) -> &[Fractal] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }

    fn head_id(&self) -> Option<FractalId> {
        self.rows.len().checked_sub(1).map(FractalId)
    }

    /// Most recent fractal, or the best of its side when `best_only`.
    pub fn head(&self, best_only: bool) -> Option<FractalId> {
        let head = self.head_id()?;
        Some(if best_only { self.best_of_side(head) } else { head })
    }

    /// Most recent fractal on `side`, or the best of that side when `best_only`.
    pub fn last_of_side(&self, side: Side, best_only: bool) -> Option<FractalId> {
        let head = self.head_id()?;
        let found = if self.rows[head.0].side == side {
            head
        } else {
            self.walk_to_side(self.rows[head.0].previous, side)?
        };
        Some(if best_only { self.best_of_side(found) } else { found })
    }

    /// Nearest older fractal on the same side as `id`.
    pub fn previous_of_same_side(&self, id: FractalId) -> Option<FractalId> {
        let node = self.get(id)?;
        self.walk_to_side(node.previous, node.side)
    }

    fn walk_to_side(&self, start: Option<FractalId>, side: Side) -> Option<FractalId> {
        let mut cursor = start;
        while let Some(id) = cursor {
            let node = &self.rows[id.0];
            if node.side == side {
                return Some(id);
            }
            cursor = node.previous;
        }
        None
    }

    /// Walks same-side predecessors from `id` while they are at least as extreme
    /// as the current candidate and returns the last one reached.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this chain.
    pub fn best_of_side(&self, id: FractalId) -> FractalId {
        let side = self.rows[id.0].side;
        let mut candidate = id;
        while let Some(prev) = self.previous_of_same_side(candidate) {
            if !side.not_worse(self.rows[prev.0].value, self.rows[candidate.0].value) {
                break;
            }
            candidate = prev;
        }
        candidate
    }

    /// Same-side predecessors superseded by `id`, oldest first: the contiguous
    /// run of older same-side fractals whose value `id` matches or exceeds.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this chain.
    pub fn bad_fractals(&self, id: FractalId) -> Vec<FractalId> {
        let node = &self.rows[id.0];
        let mut out = Vec::new();
        let mut cursor = self.previous_of_same_side(id);
        while let Some(prev) = cursor {
            if !node.side.not_worse(node.value, self.rows[prev.0].value) {
                break;
            }
            out.push(prev);
            cursor = self.previous_of_same_side(prev);
        }
        out.reverse();
        out
    }

    /// Higher/lower classification against the previous fractal of the same side.
    /// The first fractal of a side counts as a new extreme.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this chain.
    pub fn kind(&self, id: FractalId) -> FractalKind {
        let node = &self.rows[id.0];
        let previous = self
            .previous_of_same_side(id)
            .map(|prev| self.rows[prev.0].value);
        match node.side {
            Side::High => match previous {
                Some(prev) if node.value <= prev => FractalKind::LowerHigh,
                _ => FractalKind::HigherHigh,
            },
            Side::Low => match previous {
                Some(prev) if node.value >= prev => FractalKind::HigherLow,
                _ => FractalKind::LowerLow,
            },
        }
    }

    /// A fractal is fake once a later fractal of its side is at least as extreme.
    pub fn is_fake(&self, id: FractalId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        self.rows[id.0 + 1..]
            .iter()
            .any(|later| later.side == node.side && node.side.not_worse(later.value, node.value))
    }

    /// `is_fake` for every node in one backward pass.
    pub fn fake_flags(&self) -> Vec<bool> {
        let mut flags = vec![false; self.rows.len()];
        let mut best_high: Option<f64> = None;
        let mut best_low: Option<f64> = None;
        for (pos, node) in self.rows.iter().enumerate().rev() {
            let best_later = match node.side {
                Side::High => &mut best_high,
                Side::Low => &mut best_low,
            };
            if let Some(best) = *best_later {
                flags[pos] = node.side.not_worse(best, node.value);
                if node.side.not_worse(node.value, best) {
                    *best_later = Some(node.value);
                }
            } else {
                *best_later = Some(node.value);
            }
        }
        flags
    }

    pub fn dataframe(&self) -> Result<DataFrame, DataError> {
        let fakes = self.fake_flags();
        let index: Vec<u64> = self.rows.iter().map(|x| x.index as u64).collect();
        let datetime: Vec<i64> = self
            .rows
            .iter()
            .map(|x| x.datetime.timestamp_millis())
            .collect();
        let value: Vec<f64> = self.rows.iter().map(|x| x.value).collect();
        let side: Vec<String> = self
            .rows
            .iter()
            .map(|x| x.side.as_str().to_string())
            .collect();
        let kind: Vec<String> = self
            .iter()
            .map(|(id, _)| self.kind(id).code().to_string())
            .collect();
        let previous_index: Vec<Option<u64>> = self
            .rows
            .iter()
            .map(|x| x.previous.map(|p| self.rows[p.0].index as u64))
            .collect();
        let best: Vec<bool> = self
            .iter()
            .map(|(id, _)| self.best_of_side(id) == id)
            .collect();
        let prefix: Vec<String> = self.rows.iter().map(|x| x.prefix.to_string()).collect();

        let frame = df!(
            "index" => index,
            "datetime" => datetime,
            "value" => value,
            "side" => side,
            "kind" => kind,
            "previous_index" => previous_index,
            "best" => best,
            "fake" => fakes,
            "prefix" => prefix
        )?;
        Ok(frame)
    }
}
