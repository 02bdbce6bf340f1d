//! Scan records captured by the mobile client.
//!
//! The typed fields cover what the scanner fills in; every other key the
//! backend or an older client version put on the object is kept in `extra`
//! so a queue written by one build survives being read by another.

use chrono::Utc;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geo::{is_final_destination, Coordinates};

/// One physical scan of a box.
///
/// Identity is positional inside the offline queue; `id` is whatever the
/// client or server assigned and is not enforced to be unique here.
///
/// A typed field is only populated when the stored value re-encodes to the
/// exact same JSON. A numeric `id`, a float `time` or a `null` stays in
/// `extra` untouched, so decoding never drops or rewrites a value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    /// Capture time in epoch milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ScanLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_destination: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marked_as_received: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Geolocation attached to a scan, shaped like the device location API
/// output (`location.coords.latitude`). Device keys such as `mocked` are
/// kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanLocation {
    pub coords: ScanCoords,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Position fix. `altitude`, `heading`, `speed` and the other device keys
/// live in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCoords {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Move `key` out of `map` as a `T` if it encodes back to the same JSON.
/// Otherwise the raw value stays in `map`.
fn take_exact<T>(map: &mut Map<String, Value>, key: &str) -> Option<T>
where
    T: DeserializeOwned + Serialize,
{
    let value = map.remove(key)?;
    match T::deserialize(&value) {
        Ok(typed) if serde_json::to_value(&typed).ok().as_ref() == Some(&value) => Some(typed),
        _ => {
            map.insert(key.to_string(), value);
            None
        }
    }
}

impl<'de> Deserialize<'de> for ScanRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            id: take_exact(&mut extra, "id"),
            box_id: take_exact(&mut extra, "boxId"),
            operator_id: take_exact(&mut extra, "operatorId"),
            time: take_exact(&mut extra, "time"),
            location: take_exact(&mut extra, "location"),
            comment: take_exact(&mut extra, "comment"),
            final_destination: take_exact(&mut extra, "finalDestination"),
            marked_as_received: take_exact(&mut extra, "markedAsReceived"),
            extra,
        })
    }
}

impl<'de> Deserialize<'de> for ScanLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        let coords =
            take_exact(&mut extra, "coords").ok_or_else(|| D::Error::missing_field("coords"))?;
        Ok(Self { coords, timestamp: take_exact(&mut extra, "timestamp"), extra })
    }
}

impl<'de> Deserialize<'de> for ScanCoords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        let latitude =
            take_exact(&mut extra, "latitude").ok_or_else(|| D::Error::missing_field("latitude"))?;
        let longitude = take_exact(&mut extra, "longitude")
            .ok_or_else(|| D::Error::missing_field("longitude"))?;
        Ok(Self { latitude, longitude, accuracy: take_exact(&mut extra, "accuracy"), extra })
    }
}

impl ScanRecord {
    /// Capture a new scan of `box_id` at `position`, timestamped now.
    pub fn capture(box_id: impl Into<String>, position: Coordinates) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            box_id: Some(box_id.into()),
            time: Some(now),
            location: Some(ScanLocation {
                coords: ScanCoords {
                    latitude: position.latitude,
                    longitude: position.longitude,
                    accuracy: None,
                    extra: Map::new(),
                },
                timestamp: Some(now),
                extra: Map::new(),
            }),
            ..Self::default()
        }
    }

    /// Record with only an `id`, mostly useful for fixtures.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), ..Self::default() }
    }

    pub fn operator(mut self, operator_id: impl Into<String>) -> Self {
        self.extra.remove("operatorId");
        self.operator_id = Some(operator_id.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.extra.remove("comment");
        self.comment = Some(comment.into());
        self
    }

    pub fn accuracy(mut self, meters: f64) -> Self {
        if let Some(location) = self.location.as_mut() {
            location.coords.extra.remove("accuracy");
            location.coords.accuracy = Some(meters);
        }
        self
    }

    pub fn received(mut self, received: bool) -> Self {
        self.extra.remove("markedAsReceived");
        self.marked_as_received = Some(received);
        self
    }

    /// Position of the scan, if the device reported one.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location
            .as_ref()
            .map(|loc| Coordinates::new(loc.coords.latitude, loc.coords.longitude))
    }

    /// Set `finalDestination` from the distance to the destination school.
    ///
    /// Scans without a location are left untouched. Returns whether the flag
    /// changed.
    pub fn mark_destination(&mut self, school: Coordinates, radius_meters: f64) -> bool {
        let Some(position) = self.coordinates() else {
            return false;
        };
        let reached = is_final_destination(school, position, radius_meters);
        let changed = self.final_destination.unwrap_or(false) != reached;
        self.extra.remove("finalDestination");
        self.final_destination = Some(reached);
        changed
    }

    /// Short label for log fields: the id, else the box id, else `"?"`.
    pub fn label(&self) -> &str {
        self.id.as_deref().or(self.box_id.as_deref()).unwrap_or("?")
    }
}

/// Records that failed ingest during one drain pass, in queue order.
pub type FailedBatch = Vec<ScanRecord>;

/// Re-derive `finalDestination` for every scan of a box whose school
/// coordinates changed. Returns how many scans flipped.
pub fn recalculate_final_destinations(
    school: Coordinates,
    scans: &mut [ScanRecord],
    radius_meters: f64,
) -> usize {
    scans
        .iter_mut()
        .map(|scan| scan.mark_destination(school, radius_meters))
        .filter(|changed| *changed)
        .count()
}
