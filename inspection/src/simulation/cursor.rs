use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;

use super::{Origin, SimulationDraw, SyntheticSensors, now_timestamp};
use crate::{
    config::{InspectionConfig, Sensors, SnapshotKey},
    error::Result,
    normalizer::{self, CanonicalTable, RawRecord, Role},
    schema::{HUMIDITY, PRESSURE, TEMPERATURE},
};

#[derive(Debug, Clone)]
struct Snapshot {
    table: Arc<CanonicalTable>,
    index: usize,
}

impl Snapshot {
    fn new(table: CanonicalTable) -> Self {
        Self {
            table: Arc::new(table),
            index: 0,
        }
    }

    fn advanced(&self) -> usize {
        (self.index + 1) % self.table.len()
    }
}

/// Replays the last supplied simulation set one row at a time, wrapping at the end.
///
/// The snapshot and its position are guarded by a single lock, so replacing the snapshot,
/// reading a row and advancing happen as one step for concurrent callers.
#[derive(Debug)]
pub struct SimulationCursor {
    snapshot: Mutex<Option<Snapshot>>,
    key: SnapshotKey,
    defaults: Sensors,
    synthetic: SyntheticSensors,
    fallback_count: usize,
}

impl SimulationCursor {
    /// Creates a new `SimulationCursor` without a snapshot.
    ///
    /// # Arguments
    /// * `config` - Provides the snapshot key, sensor defaults, synthetic distributions and the
    ///   fallback count.
    pub fn new(config: &InspectionConfig) -> Result<Self> {
        Ok(Self {
            snapshot: Mutex::new(None),
            key: config.snapshot_key(),
            defaults: config.sensor_defaults(),
            synthetic: SyntheticSensors::new(&config.synthetic())?,
            fallback_count: config.fallback_count(),
        })
    }

    /// Returns the size of the simulation, never touching the snapshot.
    ///
    /// # Arguments
    /// * `records` - The supplied simulation set, an empty one counts as not supplied.
    pub fn count(&self, records: Option<&[RawRecord]>) -> usize {
        supplied(records).map_or(self.fallback_count, <[RawRecord]>::len)
    }

    /// Produces the next sample and advances.
    pub fn next(&self, records: Option<&[RawRecord]>) -> Result<SimulationDraw> {
        self.next_with(records, Ok)
    }

    /// Produces the next sample and hands it to `f`.
    ///
    /// A snapshot replacement and the index advance are only committed if `f` succeeds, a
    /// failing consumer leaves the cursor where it was. Under the length key a supplied set as
    /// long as the snapshot is not normalized at all.
    ///
    /// # Arguments
    /// * `records` - The supplied simulation set, if any.
    /// * `f` - Consumes the drawn sample.
    ///
    /// # Returns
    /// What `f` returns, or a normalization error.
    pub fn next_with<T, F>(&self, records: Option<&[RawRecord]>, f: F) -> Result<T>
    where
        F: FnOnce(SimulationDraw) -> Result<T>,
    {
        let mut guard = self.snapshot.lock();

        let replacement = match supplied(records) {
            Some(records) => self.replacement(guard.as_ref(), records)?,
            None => None,
        };

        let Some(active) = replacement.as_ref().or(guard.as_ref()) else {
            return f(self.synthetic.draw(&mut rand::rng()));
        };

        let draw = self.draw_row(active);
        let next_index = active.advanced();
        let out = f(draw)?;

        if let Some(snapshot) = replacement {
            info!(
                "simulation snapshot replaced: records={}, columns={:?}",
                snapshot.table.len(),
                snapshot.table.columns()
            );
            *guard = Some(snapshot);
        }

        if let Some(snapshot) = guard.as_mut() {
            snapshot.index = next_index;
            debug!("simulation cursor advanced to {next_index}");
        }

        Ok(out)
    }

    /// Forgets the snapshot.
    pub fn reset(&self) {
        *self.snapshot.lock() = None;
    }

    /// Returns `(index, length)` of the snapshot, if any.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.snapshot
            .lock()
            .as_ref()
            .map(|s| (s.index, s.table.len()))
    }

    /// The snapshot `records` should replace `current` with, if they differ under the key.
    fn replacement(
        &self,
        current: Option<&Snapshot>,
        records: &[RawRecord],
    ) -> Result<Option<Snapshot>> {
        if let Some(current) = current
            && self.key == SnapshotKey::Length
            && current.table.len() == records.len()
        {
            return Ok(None);
        }

        let table = normalizer::normalize(records, Role::Simulation)?;
        let replace = current.is_none_or(|current| *current.table != table);

        Ok(replace.then(|| Snapshot::new(table)))
    }

    fn draw_row(&self, snapshot: &Snapshot) -> SimulationDraw {
        let row = snapshot.table.row(snapshot.index);

        SimulationDraw {
            origin: Origin::Snapshot {
                index: snapshot.index,
            },
            features: row.iter().map(|(name, v)| (name.to_string(), v)).collect(),
            sensors: Sensors {
                temperature: row.get(TEMPERATURE).unwrap_or(self.defaults.temperature),
                pressure: row.get(PRESSURE).unwrap_or(self.defaults.pressure),
                humidity: row.get(HUMIDITY).unwrap_or(self.defaults.humidity),
            },
            timestamp: row
                .timestamp()
                .map_or_else(now_timestamp, str::to_string),
        }
    }
}

fn supplied(records: Option<&[RawRecord]>) -> Option<&[RawRecord]> {
    records.filter(|r| !r.is_empty())
}
