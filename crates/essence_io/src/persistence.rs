//! Save-state files.
//!
//! Three encodings are supported, chosen by file extension: plain JSON,
//! gzip-compressed JSON (`.gz`) and an rkyv archive (`.rkyv`). JSON input is
//! decoded leniently so a single damaged channel does not cost the others.

use crate::error::{IoError, Result};
use crate::serialization::{from_json, read_json_file, to_json_pretty, write_json_file};
use essence_core::trail::{ChannelRestore, RestoreReport, TrailField};
use essence_data::{SaveMetadata, SaveState, Tick, TrailSnapshot, SAVE_FORMAT_VERSION};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rkyv::de::deserializers::SharedDeserializeMap;
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::{Archive, Deserialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// On-disk encoding of a save file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Json,
    GzipJson,
    Rkyv,
}

impl SaveFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => SaveFormat::GzipJson,
            Some("rkyv") => SaveFormat::Rkyv,
            _ => SaveFormat::Json,
        }
    }
}

/// Reasons trail channels were present in a save but could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFaults {
    pub amount: Option<String>,
    pub author_id: Option<String>,
    pub deposit_tick: Option<String>,
}

impl ChannelFaults {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.author_id.is_none() && self.deposit_tick.is_none()
    }
}

/// A save as read back, with the channels that were dropped while decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedState {
    pub state: SaveState,
    pub faults: ChannelFaults,
}

impl From<SaveState> for LoadedState {
    fn from(state: SaveState) -> Self {
        Self {
            state,
            faults: ChannelFaults::default(),
        }
    }
}

/// Builds a save stamped with the current time.
#[must_use]
pub fn new_save_state(tick: Tick, trail: TrailSnapshot, config_fingerprint: Option<String>) -> SaveState {
    SaveState {
        metadata: SaveMetadata {
            version: SAVE_FORMAT_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            config_fingerprint,
        },
        tick,
        trail: Some(trail),
    }
}

/// Writes a save in the format implied by `path`.
pub fn save_state<P: AsRef<Path>>(path: P, state: &SaveState) -> Result<()> {
    let path = path.as_ref();
    let result = match SaveFormat::from_path(path) {
        SaveFormat::Json => write_json_file(state, path),
        SaveFormat::GzipJson => write_gzip(path, to_json_pretty(state)?.as_bytes()),
        SaveFormat::Rkyv => save_rkyv(state, path),
    };
    result.map_err(|e| e.with_context(format!("saving state to {:?}", path)))?;
    tracing::info!(path = %path.display(), tick = state.tick, "Saved state");
    Ok(())
}

/// Reads a save written by [`save_state`], or a hand-edited JSON file.
pub fn load_state<P: AsRef<Path>>(path: P) -> Result<LoadedState> {
    let path = path.as_ref();
    let result = match SaveFormat::from_path(path) {
        SaveFormat::Json => read_json_file::<Value, _>(path).and_then(decode_state),
        SaveFormat::GzipJson => read_gzip(path)
            .and_then(|text| from_json::<Value>(&text))
            .and_then(decode_state),
        SaveFormat::Rkyv => load_rkyv::<SaveState, _>(path).map(LoadedState::from),
    };
    let loaded = result.map_err(|e| e.with_context(format!("loading state from {:?}", path)))?;
    tracing::info!(path = %path.display(), tick = loaded.state.tick, "Loaded state");
    Ok(loaded)
}

/// Applies the trail channels of a save to `field`.
///
/// Channels that were dropped while decoding are reported as rejected.
pub fn restore_into(field: &mut TrailField, loaded: &LoadedState) -> RestoreReport {
    let state = &loaded.state;
    if let Some(trail) = &state.trail {
        if grid_mismatch(trail, field) {
            tracing::warn!(
                saved_width = trail.width,
                saved_height = trail.height,
                width = field.width(),
                height = field.height(),
                "Save was taken on a different grid"
            );
        }
    }
    let mut report = field.apply_snapshot(state.trail.as_ref());
    let faults = &loaded.faults;
    for (slot, fault) in [
        (&mut report.amount, &faults.amount),
        (&mut report.author_id, &faults.author_id),
        (&mut report.deposit_tick, &faults.deposit_tick),
    ] {
        if let Some(reason) = fault {
            if *slot == ChannelRestore::Absent {
                *slot = ChannelRestore::Rejected(reason.clone());
            }
        }
    }
    report
}

/// True when the save names its grid and that grid differs from `field`'s.
/// Hand-written saves often leave the dimensions out; those are not compared.
fn grid_mismatch(trail: &TrailSnapshot, field: &TrailField) -> bool {
    trail.cell_count() > 0
        && (trail.width as usize != field.width() || trail.height as usize != field.height())
}

/// Decodes a save from loosely-typed JSON.
///
/// Only the envelope is mandatory. Each trail channel is decoded on its own;
/// one that is not an array of the right element type is dropped with a
/// warning, left as `None` and recorded in [`LoadedState::faults`].
pub fn decode_state(value: Value) -> Result<LoadedState> {
    let Value::Object(mut root) = value else {
        return Err(IoError::validation("Save state must be a JSON object"));
    };

    let metadata: SaveMetadata = match root.remove("metadata") {
        Some(meta) => serde_json::from_value(meta)
            .map_err(|e| IoError::validation(format!("Invalid metadata: {}", e)))?,
        None => return Err(IoError::validation("Save state has no metadata")),
    };
    if metadata.version > SAVE_FORMAT_VERSION {
        return Err(IoError::validation(format!(
            "Unsupported save version {} (newest known is {})",
            metadata.version, SAVE_FORMAT_VERSION
        )));
    }

    let tick = match root.get("tick") {
        None | Some(Value::Null) => 0,
        Some(v) => as_u32(v).ok_or_else(|| IoError::validation("Invalid tick"))?,
    };

    let mut faults = ChannelFaults::default();
    let trail = match root.remove("trail") {
        Some(Value::Object(obj)) => Some(decode_trail(&obj, &mut faults)),
        None | Some(Value::Null) => None,
        Some(_) => {
            tracing::warn!("Ignoring trail section that is not an object");
            None
        }
    };

    Ok(LoadedState {
        state: SaveState {
            metadata,
            tick,
            trail,
        },
        faults,
    })
}

fn decode_trail(obj: &Map<String, Value>, faults: &mut ChannelFaults) -> TrailSnapshot {
    TrailSnapshot {
        amount: decode_channel(obj, "amount", |v| v.as_f64().map(|f| f as f32), &mut faults.amount),
        author_id: decode_channel(obj, "authorId", as_u32, &mut faults.author_id),
        deposit_tick: decode_channel(obj, "depositTick", as_u32, &mut faults.deposit_tick),
        width: obj.get("width").and_then(as_u32).unwrap_or(0),
        height: obj.get("height").and_then(as_u32).unwrap_or(0),
        cell_size: obj
            .get("cellSize")
            .and_then(Value::as_f64)
            .map_or(0.0, |f| f as f32),
    }
}

fn decode_channel<T, F>(
    obj: &Map<String, Value>,
    name: &str,
    element: F,
    fault: &mut Option<String>,
) -> Option<Vec<T>>
where
    F: Fn(&Value) -> Option<T>,
{
    let value = obj.get(name)?;
    if value.is_null() {
        return None;
    }
    let Some(items) = value.as_array() else {
        tracing::warn!(channel = name, "Dropping trail channel: not an array");
        *fault = Some("not an array".to_string());
        return None;
    };
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match element(item) {
            Some(v) => out.push(v),
            None => {
                tracing::warn!(channel = name, index = i, "Dropping trail channel: bad element");
                *fault = Some(format!("bad element at index {}", i));
                return None;
            }
        }
    }
    Some(out)
}

/// Accepts non-negative integers, including integral floats such as `3.0`.
fn as_u32(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) {
        Some(f as u32)
    } else {
        None
    }
}

fn write_gzip(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(bytes)?;
    encoder
        .finish()
        .map_err(|e| IoError::compression(format!("finishing gzip stream: {}", e)))?;
    Ok(())
}

fn read_gzip(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(file);
    let mut decoded = String::new();
    decoder
        .read_to_string(&mut decoded)
        .map_err(|e| IoError::compression(format!("reading gzip stream: {}", e)))?;
    Ok(decoded)
}

pub fn save_rkyv<T, P>(data: &T, path: P) -> Result<()>
where
    T: rkyv::Serialize<AllocSerializer<4096>>,
    T: Archive,
    P: AsRef<Path>,
{
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(data)
        .map_err(|e| IoError::rkyv(format!("serialization error: {:?}", e)))?;
    let bytes = serializer.into_serializer().into_inner();
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

pub fn load_rkyv<T, P>(path: P) -> Result<T>
where
    T: Archive,
    T::Archived: Deserialize<T, SharedDeserializeMap>
        + for<'a> rkyv::CheckBytes<rkyv::validation::validators::DefaultValidator<'a>>,
    P: AsRef<Path>,
{
    let raw = std::fs::read(path)?;
    let mut bytes = rkyv::AlignedVec::with_capacity(raw.len());
    bytes.extend_from_slice(&raw);
    let archived = rkyv::check_archived_root::<T>(&bytes)
        .map_err(|e| IoError::rkyv(format!("validation error: {:?}", e)))?;
    let mut deserializer = SharedDeserializeMap::default();
    archived
        .deserialize(&mut deserializer)
        .map_err(|e| IoError::rkyv(format!("deserialization error: {:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(trail: Value) -> Value {
        json!({
            "metadata": { "version": 1, "exportedAt": "2024-01-01T00:00:00Z" },
            "tick": 42,
            "trail": trail,
        })
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SaveFormat::from_path(Path::new("a.json")), SaveFormat::Json);
        assert_eq!(SaveFormat::from_path(Path::new("a.json.gz")), SaveFormat::GzipJson);
        assert_eq!(SaveFormat::from_path(Path::new("a.rkyv")), SaveFormat::Rkyv);
        assert_eq!(SaveFormat::from_path(Path::new("save")), SaveFormat::Json);
    }

    #[test]
    fn test_decode_full_state() {
        let loaded = decode_state(envelope(json!({
            "amount": [0.0, 0.5],
            "authorId": [0, 2],
            "depositTick": [0, 40],
            "width": 2, "height": 1, "cellSize": 7
        })))
        .unwrap();
        assert!(loaded.faults.is_empty());
        assert_eq!(loaded.state.tick, 42);
        let trail = loaded.state.trail.unwrap();
        assert_eq!(trail.amount, Some(vec![0.0, 0.5]));
        assert_eq!(trail.author_id, Some(vec![0, 2]));
        assert_eq!(trail.deposit_tick, Some(vec![0, 40]));
        assert_eq!(trail.cell_size, 7.0);
    }

    #[test]
    fn test_decode_drops_only_bad_channel() {
        let loaded = decode_state(envelope(json!({
            "amount": [0.25, 0.5],
            "authorId": "corrupt",
            "depositTick": [1, -3]
        })))
        .unwrap();
        let trail = loaded.state.trail.unwrap();
        assert_eq!(trail.amount, Some(vec![0.25, 0.5]));
        assert_eq!(trail.author_id, None);
        assert_eq!(trail.deposit_tick, None);
        assert_eq!(loaded.faults.amount, None);
        assert_eq!(loaded.faults.author_id.as_deref(), Some("not an array"));
        assert_eq!(loaded.faults.deposit_tick.as_deref(), Some("bad element at index 1"));
    }

    #[test]
    fn test_undecodable_channel_reported_rejected() {
        let loaded = decode_state(envelope(json!({
            "amount": [0.1, 0.2, 0.3, 0.4],
            "authorId": [1, -7, 3, 4]
        })))
        .unwrap();
        let config = essence_core::TrailConfig {
            cell_size: 1.0,
            ..Default::default()
        };
        let mut field = TrailField::with_viewport(config, 2.0, 2.0);

        let report = restore_into(&mut field, &loaded);
        assert!(report.amount.is_applied());
        assert!(matches!(report.author_id, ChannelRestore::Rejected(_)));
        assert_eq!(report.deposit_tick, ChannelRestore::Absent);
        assert_eq!(report.rejected_count(), 1);
        assert_eq!(field.live().author, vec![0; 4]);
    }

    #[test]
    fn test_decode_accepts_integral_floats() {
        let loaded = decode_state(envelope(json!({ "authorId": [1.0, 2.0], "depositTick": [3.5] }))).unwrap();
        let trail = loaded.state.trail.unwrap();
        assert_eq!(trail.author_id, Some(vec![1, 2]));
        assert_eq!(trail.deposit_tick, None);
    }

    #[test]
    fn test_decode_requires_envelope() {
        assert!(decode_state(json!([1, 2, 3])).is_err());
        assert!(decode_state(json!({ "tick": 1 })).is_err());
        let future = json!({ "metadata": { "version": 99, "exportedAt": "" } });
        assert!(matches!(decode_state(future), Err(IoError::Validation(_))));
    }

    #[test]
    fn test_grid_mismatch_ignores_missing_dimensions() {
        let config = essence_core::TrailConfig {
            cell_size: 1.0,
            ..Default::default()
        };
        let field = TrailField::with_viewport(config, 3.0, 2.0);
        let mut trail = TrailSnapshot {
            amount: None,
            author_id: None,
            deposit_tick: None,
            width: 0,
            height: 0,
            cell_size: 0.0,
        };
        assert!(!grid_mismatch(&trail, &field));

        (trail.width, trail.height) = (3, 2);
        assert!(!grid_mismatch(&trail, &field));

        (trail.width, trail.height) = (4, 2);
        assert!(grid_mismatch(&trail, &field));
    }

    #[test]
    fn test_decode_without_trail() {
        let loaded = decode_state(envelope(Value::Null)).unwrap();
        assert!(loaded.state.trail.is_none());
        assert!(loaded.faults.is_empty());
    }
}
