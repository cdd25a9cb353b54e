use super::trail::TrailSnapshot;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

pub const SAVE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
#[serde(rename_all = "camelCase")]
pub struct SaveMetadata {
    pub version: u32,
    /// RFC 3339 timestamp of the export.
    pub exported_at: String,
    /// Fingerprint of the trail rules that produced the save.
    #[serde(default)]
    pub config_fingerprint: Option<String>,
}

/// A complete save-state as written by the CLI and the browser binding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    pub metadata: SaveMetadata,
    #[serde(default)]
    pub tick: u32,
    #[serde(default)]
    pub trail: Option<TrailSnapshot>,
}
