//! Persisted travel-time records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::RouteId;

/// Route-level measures of effectiveness for one timestep.
///
/// `tt`, `speed` and `acceleration` are `None` when no station produced a
/// usable value at that timestep.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoeValues {
    pub tt: Option<f64>,
    pub speed: Option<f64>,
    pub vmt: f64,
    pub vht: f64,
    pub dvh: f64,
    pub lvmt: f64,
    pub uvmt: f64,
    pub cm: f64,
    pub cmh: f64,
    pub acceleration: Option<f64>,
}

/// A row to be inserted into the travel-time store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTravelTime {
    pub route_id: RouteId,
    pub time: NaiveDateTime,
    pub values: MoeValues,
    /// Serialized [`crate::snapshot::MetaData`].
    pub meta_data: String,
}

/// A stored travel-time row. At most one exists per `(route_id, time)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelTimeRecord {
    pub id: i64,
    pub route_id: RouteId,
    pub time: NaiveDateTime,
    pub values: MoeValues,
    pub meta_data: String,
}

impl TravelTimeRecord {
    pub fn key(&self) -> (RouteId, NaiveDateTime) {
        (self.route_id, self.time)
    }

    /// Apply the fields set in `update`; everything else is left alone.
    pub fn apply(&mut self, update: &TravelTimeUpdate) {
        let v = &mut self.values;
        if let Some(x) = update.vht {
            v.vht = x;
        }
        if let Some(x) = update.dvh {
            v.dvh = x;
        }
        if let Some(x) = update.lvmt {
            v.lvmt = x;
        }
        if let Some(x) = update.uvmt {
            v.uvmt = x;
        }
        if let Some(x) = update.cm {
            v.cm = x;
        }
        if let Some(x) = update.cmh {
            v.cmh = x;
        }
        if let Some(x) = update.acceleration {
            v.acceleration = x;
        }
        if let Some(ref meta) = update.meta_data {
            self.meta_data = meta.clone();
        }
    }
}

/// Field-level update of a stored row. `None` leaves a field untouched;
/// the key columns are never part of an update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TravelTimeUpdate {
    pub vht: Option<f64>,
    pub dvh: Option<f64>,
    pub lvmt: Option<f64>,
    pub uvmt: Option<f64>,
    pub cm: Option<f64>,
    pub cmh: Option<f64>,
    pub acceleration: Option<Option<f64>>,
    pub meta_data: Option<String>,
}

impl TravelTimeUpdate {
    /// The mutable columns of a freshly computed row, as written by the
    /// create-or-update run.
    pub fn from_row(row: &NewTravelTime) -> Self {
        let v = &row.values;
        Self {
            vht: Some(v.vht),
            dvh: Some(v.dvh),
            lvmt: Some(v.lvmt),
            uvmt: Some(v.uvmt),
            cm: Some(v.cm),
            cmh: Some(v.cmh),
            acceleration: Some(v.acceleration),
            meta_data: Some(row.meta_data.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the staged columns, for logging.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.vht.is_some() {
            names.push("vht");
        }
        if self.dvh.is_some() {
            names.push("dvh");
        }
        if self.lvmt.is_some() {
            names.push("lvmt");
        }
        if self.uvmt.is_some() {
            names.push("uvmt");
        }
        if self.cm.is_some() {
            names.push("cm");
        }
        if self.cmh.is_some() {
            names.push("cmh");
        }
        if self.acceleration.is_some() {
            names.push("acceleration");
        }
        if self.meta_data.is_some() {
            names.push("meta_data");
        }
        names
    }
}
