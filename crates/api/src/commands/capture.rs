//! Scan capture and bulk enqueue

use std::path::Path;

use anyhow::{bail, Context};
use serde::Serialize;
use serde_json::Value;
use tnt_domain::{Coordinates, ScanRecord, TntError};
use tracing::info;

use crate::cli::CaptureArgs;
use crate::context::AppContext;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
    pub scan: ScanRecord,
    /// Queue length after the append
    pub queued: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnqueueOutcome {
    pub added: usize,
    pub queued: usize,
}

/// Build a scan from the arguments and append it to the offline queue.
pub async fn capture_scan(ctx: &AppContext, args: CaptureArgs) -> anyhow::Result<CaptureOutcome> {
    let position = Coordinates::new(args.lat, args.lon);
    if !position.is_valid() {
        return Err(TntError::InvalidInput(format!(
            "coordinates out of range: {}, {}",
            args.lat, args.lon
        ))
        .into());
    }

    let mut scan = ScanRecord::capture(args.box_id, position).received(args.received);
    if let Some(meters) = args.accuracy {
        scan = scan.accuracy(meters);
    }
    if let Some(operator) = args.operator {
        scan = scan.operator(operator);
    }
    if let Some(comment) = args.comment {
        scan = scan.comment(comment);
    }
    if let (Some(lat), Some(lon)) = (args.school_lat, args.school_lon) {
        scan.mark_destination(Coordinates::new(lat, lon), ctx.config.geofence.radius_meters);
    }

    let Some(queued) = ctx.queue.append(vec![scan.clone()]).await else {
        bail!("scan could not be queued; see log for the store error");
    };

    info!(scan = scan.label(), queued, "scan captured");
    Ok(CaptureOutcome { scan, queued })
}

/// Append scans read from a JSON file holding one scan object or an array.
pub async fn enqueue_file(ctx: &AppContext, path: &Path) -> anyhow::Result<EnqueueOutcome> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let scans = parse_scans(&raw).with_context(|| format!("invalid scan file {}", path.display()))?;

    let added = scans.len();
    if added == 0 {
        return Ok(EnqueueOutcome { added, queued: ctx.queue.len().await });
    }

    let Some(queued) = ctx.queue.append(scans).await else {
        bail!("scans could not be queued; see log for the store error");
    };
    Ok(EnqueueOutcome { added, queued })
}

/// Parse one scan object or an array of them.
pub fn parse_scans(raw: &str) -> Result<Vec<ScanRecord>, TntError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| TntError::Serialization(e.to_string()))?;
    let scans = match value {
        Value::Array(_) => serde_json::from_value(value),
        Value::Object(_) => serde_json::from_value(value).map(|scan| vec![scan]),
        other => {
            return Err(TntError::InvalidInput(format!(
                "expected a scan object or array, got {}",
                json_kind(&other)
            )))
        }
    };
    scans.map_err(|e| TntError::Serialization(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
