//! Offline queue encoding.
//!
//! The whole queue lives in one JSON array under a single key, so every
//! mutation re-serializes the entire queue.

use serde_json::Value;
use tnt_domain::{Result, ScanRecord};
use tracing::warn;

/// Serialize records as a JSON array.
pub fn encode(records: &[ScanRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Parse a stored queue value.
///
/// Absent values, `null`, and anything that is not a JSON array decode to an
/// empty queue. Array elements that are not scan objects are dropped with a
/// warning; the rest keep their order.
pub fn decode(raw: Option<&str>) -> Vec<ScanRecord> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let items = match serde_json::from_str::<Option<Vec<Value>>>(raw) {
        Ok(Some(items)) => items,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(error = %err, len = raw.len(), "stored offline queue is malformed; treating as empty");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<ScanRecord>(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(index, error = %err, "dropping malformed offline queue entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tnt_domain::Coordinates;

    use super::*;

    fn sample() -> Vec<ScanRecord> {
        vec![
            ScanRecord::with_id("s1"),
            ScanRecord::capture("box-2", Coordinates::new(-13.96, 33.77)).operator("op-1"),
            ScanRecord::with_id("s3").comment("left at gate"),
        ]
    }

    #[test]
    fn decode_inverts_encode() {
        let records = sample();
        let encoded = encode(&records).unwrap();
        assert_eq!(decode(Some(&encoded)), records);
    }

    #[test]
    fn stored_queue_re_encodes_unchanged() {
        let raw = r#"[
            {"id":"s1","boxId":"box-1","time":1700000000000,
             "location":{"coords":{"latitude":-13.9626,"longitude":33.7741,"accuracy":8.5,
                                   "altitude":1050.25,"altitudeAccuracy":3.5,"heading":180.0,"speed":0.25},
                         "mocked":false,"timestamp":1700000000123.5},
             "statusChanges":{"inProgress":1700000000000,"history":[{"by":"op-1"}]}},
            {"id":42,"boxId":"box-2","time":1700000000000.75,"comment":null},
            {"boxId":"box-3","finalDestination":"yes","markedAsReceived":true,
             "location":{"coords":{"latitude":-14,"longitude":33}}}
        ]"#;

        let decoded = decode(Some(raw));
        assert_eq!(decoded.len(), 3);

        let original: Value = serde_json::from_str(raw).unwrap();
        let reencoded: Value = serde_json::from_str(&encode(&decoded).unwrap()).unwrap();
        assert_eq!(reencoded, original);
    }

    #[test]
    fn empty_queue_encodes_as_empty_array() {
        assert_eq!(encode(&[]).unwrap(), "[]");
        assert!(decode(Some("[]")).is_empty());
    }

    #[test]
    fn absent_and_null_decode_to_empty() {
        assert!(decode(None).is_empty());
        assert!(decode(Some("null")).is_empty());
    }

    #[test]
    fn malformed_input_decodes_to_empty() {
        for raw in ["", "{", "not json", r#"{"id":"s1"}"#, "42", r#""[]""#] {
            assert!(decode(Some(raw)).is_empty(), "input {raw:?}");
        }
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let decoded = decode(Some(r#"[{"id":"s1"}, 7, "x", {"id":"s2"}]"#));
        let ids: Vec<_> = decoded.iter().map(ScanRecord::label).collect();
        assert_eq!(ids, ["s1", "s2"]);
    }
}
