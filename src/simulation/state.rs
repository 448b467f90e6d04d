//! Tag runtime state: one live cell per tag plus the committed tick snapshot
//! Location: src/simulation/state.rs
//!
//! Current values are published as an immutable [`TickSnapshot`] swapped in
//! once per cycle, so readers always see a whole tick. Perturbation offsets
//! live in per-tag cells behind their own mutex; tags never share a lock.

use crate::error::StateError;
use crate::topology::{Factory, TagId, TagRange, WaveformClass};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Point-in-time view of one tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagState {
    pub current_value: f64,
    pub perturbation_offset: f64,
}

/// One tag's value as committed at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagReading {
    pub id: TagId,
    pub path: String,
    pub value: f64,
    pub offset: f64,
}

/// All tag values of one tick, in topology order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSnapshot {
    /// `None` until the first tick has been generated
    pub tick: Option<u64>,
    pub readings: Vec<TagReading>,
}

impl TickSnapshot {
    pub fn get(&self, id: TagId) -> Option<&TagReading> {
        self.readings
            .binary_search_by_key(&id, |reading| reading.id)
            .ok()
            .map(|index| &self.readings[index])
    }

    pub fn value(&self, id: TagId) -> Option<f64> {
        self.get(id).map(|reading| reading.value)
    }
}

/// Static description plus mutable offset of one tag
#[derive(Debug)]
pub struct TagCell {
    id: TagId,
    path: String,
    range: TagRange,
    waveform: WaveformClass,
    offset: Mutex<f64>,
}

impl TagCell {
    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn range(&self) -> TagRange {
        self.range
    }

    pub fn waveform(&self) -> WaveformClass {
        self.waveform
    }

    /// Live offset; may already belong to a tick that is not committed yet
    pub(crate) fn offset(&self) -> f64 {
        *self.offset.lock()
    }

    pub(crate) fn set_offset(&self, offset: f64) {
        *self.offset.lock() = offset;
    }
}

/// Runtime state of every tag, built once from the factory
#[derive(Debug)]
pub struct RuntimeState {
    cells: Vec<TagCell>,
    index: HashMap<TagId, usize>,
    snapshot: ArcSwap<TickSnapshot>,
}

impl RuntimeState {
    /// One cell per tag, in topology order.
    ///
    /// Values start at the range midpoint and offsets at zero; the
    /// perturbation scheduler draws the startup offsets.
    pub fn new(factory: &Factory) -> Self {
        let mut cells = Vec::with_capacity(factory.tag_count());
        let mut index = HashMap::with_capacity(factory.tag_count());
        let mut readings = Vec::with_capacity(factory.tag_count());

        for entry in factory.tags() {
            let range = entry.tag.range();
            let path = entry.path.to_string();

            index.insert(entry.id, cells.len());
            readings.push(TagReading {
                id: entry.id,
                path: path.clone(),
                value: range.midpoint(),
                offset: 0.0,
            });
            cells.push(TagCell {
                id: entry.id,
                path,
                range,
                waveform: entry.tag.waveform(),
                offset: Mutex::new(0.0),
            });
        }

        Self {
            cells,
            index,
            snapshot: ArcSwap::from_pointee(TickSnapshot {
                tick: None,
                readings,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[TagCell] {
        &self.cells
    }

    pub fn cell(&self, id: TagId) -> Option<&TagCell> {
        self.index.get(&id).map(|&i| &self.cells[i])
    }

    pub fn tag_ids(&self) -> impl Iterator<Item = TagId> + '_ {
        self.cells.iter().map(|cell| cell.id)
    }

    /// Latest committed tick
    pub fn snapshot(&self) -> Arc<TickSnapshot> {
        self.snapshot.load_full()
    }

    /// Value and offset as committed together by the latest tick
    pub fn get(&self, id: TagId) -> Option<TagState> {
        let snapshot = self.snapshot.load();
        let reading = snapshot.get(id)?;
        Some(TagState {
            current_value: reading.value,
            perturbation_offset: reading.offset,
        })
    }

    pub fn current_value(&self, id: TagId) -> Option<f64> {
        self.snapshot.load().value(id)
    }

    /// Overwrite a tag's value from outside the engine.
    ///
    /// The next generated tick replaces it unconditionally.
    pub fn apply_external_write(&self, id: TagId, value: f64) -> Result<(), StateError> {
        let cell = self
            .cell(id)
            .ok_or_else(|| StateError::UnknownTag(format!("{:?}", id)))?;

        let range = cell.range();
        if !range.contains(value) {
            return Err(StateError::OutOfRange {
                path: cell.path.clone(),
                value,
                min: range.min(),
                max: range.max(),
            });
        }

        self.snapshot.rcu(|current| {
            let mut next = TickSnapshot::clone(current);
            if let Ok(i) = next.readings.binary_search_by_key(&id, |reading| reading.id) {
                next.readings[i].value = value;
            }
            next
        });
        Ok(())
    }

    pub(crate) fn commit(&self, snapshot: TickSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }
}
