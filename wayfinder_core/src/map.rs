// Map input records and per-record validation.
//
// `MapData` mirrors the document handed over by the map-loading
// collaborator: three lists (`beacons`, `waypoints`, `doorways`) of loosely
// typed records. Every field of a raw record is optional so that a single
// incomplete entry still deserializes and can be rejected on its own. The
// `validate_*` functions turn a raw record into a checked record or a
// `MalformedReason`.
//
// `MapData::from_json` is lenient at the element level too: an entry whose
// fields have the wrong JSON types is recorded in `parse_rejects` instead of
// failing the whole document. Only a syntactically broken document (or one
// whose lists are not arrays) is a `MapError`.
//
// See also: `builder.rs` which consumes the checked records, `error.rs` for
// `MalformedRecord`.

use crate::error::{MalformedReason, MalformedRecord, MapError, RecordKind};
use crate::types::{RoomId, Vec3};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Category given to beacons that do not name one.
pub const DEFAULT_BEACON_CATEGORY: &str = "general";

// ---------------------------------------------------------------------------
// Raw records (as authored)
// ---------------------------------------------------------------------------

/// A position as it appears in the map file. Components may be missing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl From<Vec3> for RawPosition {
    fn from(v: Vec3) -> Self {
        Self {
            x: Some(v.x),
            y: Some(v.y),
            z: Some(v.z),
        }
    }
}

/// A beacon or waypoint entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPoi {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "roomId", alias = "room_id")]
    pub room_id: Option<String>,
    pub category: Option<String>,
    pub position: Option<RawPosition>,
}

/// The pair of rooms a doorway joins.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConnectsRooms {
    #[serde(rename = "roomA", alias = "room_a")]
    pub room_a: Option<String>,
    #[serde(rename = "roomB", alias = "room_b")]
    pub room_b: Option<String>,
}

/// A doorway entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDoorway {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Primary room bucket. Defaults to `connectsRooms.roomA` when absent.
    #[serde(rename = "roomId", alias = "room_id")]
    pub room_id: Option<String>,
    pub position: Option<RawPosition>,
    #[serde(rename = "connectsRooms", alias = "connects_rooms")]
    pub connects_rooms: Option<RawConnectsRooms>,
}

/// A whole map document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapData {
    pub beacons: Vec<RawPoi>,
    pub waypoints: Vec<RawPoi>,
    pub doorways: Vec<RawDoorway>,
    /// Entries dropped while parsing because their fields had the wrong
    /// JSON types. Indices refer to positions in the original lists.
    #[serde(skip)]
    pub parse_rejects: Vec<MalformedRecord>,
}

#[derive(Deserialize)]
struct MapDocument {
    #[serde(default)]
    beacons: Vec<Value>,
    #[serde(default)]
    waypoints: Vec<Value>,
    #[serde(default)]
    doorways: Vec<Value>,
}

impl MapData {
    /// Parse a map document. Individual entries with wrongly typed fields
    /// are moved to `parse_rejects`; the rest of the map is kept.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let doc: MapDocument = serde_json::from_str(json)?;
        let mut parse_rejects = Vec::new();

        let beacons = parse_list(doc.beacons, RecordKind::Beacon, &mut parse_rejects);
        let waypoints = parse_list(doc.waypoints, RecordKind::Waypoint, &mut parse_rejects);
        let doorways = parse_list(doc.doorways, RecordKind::Doorway, &mut parse_rejects);

        Ok(Self {
            beacons,
            waypoints,
            doorways,
            parse_rejects,
        })
    }

    /// Read and parse a map file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn record_count(&self) -> usize {
        self.beacons.len() + self.waypoints.len() + self.doorways.len() + self.parse_rejects.len()
    }
}

fn parse_list<T: DeserializeOwned>(
    values: Vec<Value>,
    kind: RecordKind,
    rejects: &mut Vec<MalformedRecord>,
) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let id = value.get("id").and_then(Value::as_str).map(str::to_string);
        match serde_json::from_value::<T>(value) {
            Ok(record) => out.push(record),
            Err(_) => rejects.push(MalformedRecord {
                kind,
                index,
                id,
                reason: MalformedReason::InvalidField,
            }),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Checked records
// ---------------------------------------------------------------------------

/// A validated beacon or waypoint.
#[derive(Clone, Debug, PartialEq)]
pub struct PoiRecord {
    pub key: String,
    pub name: String,
    pub room: RoomId,
    /// `Some` for beacons (defaulted to `general`), `None` for waypoints.
    pub category: Option<String>,
    pub position: Vec3,
}

/// A validated doorway.
#[derive(Clone, Debug, PartialEq)]
pub struct DoorwayRecord {
    pub key: String,
    pub name: String,
    /// Primary room bucket the doorway is indexed under.
    pub room: RoomId,
    pub position: Vec3,
    pub room_a: RoomId,
    pub room_b: RoomId,
}

/// Ids and room names are opaque: a blank one is missing, anything else is
/// kept verbatim, surrounding whitespace included.
fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn checked_id(id: &Option<String>) -> Result<String, MalformedReason> {
    match id.as_deref() {
        Some(s) if !is_blank(s) => Ok(s.to_string()),
        _ => Err(MalformedReason::MissingId),
    }
}

fn checked_position(pos: &Option<RawPosition>) -> Result<Vec3, MalformedReason> {
    let p = pos.ok_or(MalformedReason::MissingPosition)?;
    let (Some(x), Some(y), Some(z)) = (p.x, p.y, p.z) else {
        return Err(MalformedReason::MissingPosition);
    };
    let v = Vec3::new(x, y, z);
    if !v.is_finite() {
        return Err(MalformedReason::NonFinitePosition);
    }
    Ok(v)
}

fn checked_room(room: &Option<String>) -> Option<RoomId> {
    room.as_deref()
        .filter(|s| !is_blank(s))
        .map(RoomId::from)
}

/// Validate a beacon (`is_beacon`) or waypoint entry.
pub fn validate_poi(raw: &RawPoi, is_beacon: bool) -> Result<PoiRecord, MalformedReason> {
    let key = checked_id(&raw.id)?;
    let position = checked_position(&raw.position)?;
    let room = checked_room(&raw.room_id).ok_or(MalformedReason::MissingRoom)?;
    let category = is_beacon.then(|| {
        raw.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_BEACON_CATEGORY)
            .to_string()
    });
    let name = raw.name.clone().unwrap_or_else(|| key.clone());
    Ok(PoiRecord {
        key,
        name,
        room,
        category,
        position,
    })
}

/// Validate a doorway entry.
pub fn validate_doorway(raw: &RawDoorway) -> Result<DoorwayRecord, MalformedReason> {
    let key = checked_id(&raw.id)?;
    let position = checked_position(&raw.position)?;
    let connects = raw
        .connects_rooms
        .as_ref()
        .ok_or(MalformedReason::MissingConnectsRooms)?;
    let room_a = checked_room(&connects.room_a).ok_or(MalformedReason::MissingConnectsRooms)?;
    let room_b = checked_room(&connects.room_b).ok_or(MalformedReason::MissingConnectsRooms)?;
    if room_a == room_b {
        return Err(MalformedReason::SelfLoopDoorway);
    }
    let room = checked_room(&raw.room_id).unwrap_or_else(|| room_a.clone());
    let name = raw.name.clone().unwrap_or_else(|| key.clone());
    Ok(DoorwayRecord {
        key,
        name,
        room,
        position,
        room_a,
        room_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "beacons": [
            { "id": "fridge", "name": "Fridge", "roomId": "kitchen", "category": "destination",
              "position": { "x": 1.0, "y": 0.0, "z": 2.0 } },
            { "id": "lamp", "roomId": "hall", "position": { "x": 5.0, "y": 0.0, "z": 0.0 } }
        ],
        "waypoints": [
            { "id": "w1", "name": "Kitchen centre", "roomId": "kitchen",
              "position": { "x": 0.0, "y": 0.0, "z": 0.0 } }
        ],
        "doorways": [
            { "id": "d1", "name": "Kitchen door", "roomId": "kitchen",
              "position": { "x": 3.0, "y": 0.0, "z": 0.0 },
              "connectsRooms": { "roomA": "kitchen", "roomB": "hall" } }
        ]
    }"#;

    #[test]
    fn parses_camel_case_document() {
        let map = MapData::from_json(SAMPLE).unwrap();
        assert_eq!(map.beacons.len(), 2);
        assert_eq!(map.waypoints.len(), 1);
        assert_eq!(map.doorways.len(), 1);
        assert!(map.parse_rejects.is_empty());
        let door = validate_doorway(&map.doorways[0]).unwrap();
        assert_eq!(door.room_a, RoomId::from("kitchen"));
        assert_eq!(door.room_b, RoomId::from("hall"));
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let map = MapData::from_json(r#"{ "waypoints": [] }"#).unwrap();
        assert_eq!(map.record_count(), 0);
    }

    #[test]
    fn wrongly_typed_entry_is_rejected_alone() {
        let json = r#"{
            "beacons": [
                { "id": "bad", "roomId": "kitchen", "position": { "x": "one", "y": 0, "z": 0 } },
                { "id": "good", "roomId": "kitchen", "position": { "x": 1, "y": 0, "z": 0 } }
            ]
        }"#;
        let map = MapData::from_json(json).unwrap();
        assert_eq!(map.beacons.len(), 1);
        assert_eq!(map.parse_rejects.len(), 1);
        let reject = &map.parse_rejects[0];
        assert_eq!(reject.kind, RecordKind::Beacon);
        assert_eq!(reject.index, 0);
        assert_eq!(reject.id.as_deref(), Some("bad"));
        assert_eq!(reject.reason, MalformedReason::InvalidField);
    }

    #[test]
    fn broken_document_is_an_error() {
        assert!(MapData::from_json("{ \"beacons\": [").is_err());
        assert!(MapData::from_json(r#"{ "beacons": 3 }"#).is_err());
    }

    #[test]
    fn beacon_category_defaults_to_general() {
        let map = MapData::from_json(SAMPLE).unwrap();
        let lamp = validate_poi(&map.beacons[1], true).unwrap();
        assert_eq!(lamp.category.as_deref(), Some(DEFAULT_BEACON_CATEGORY));
        // Name falls back to the id.
        assert_eq!(lamp.name, "lamp");
    }

    #[test]
    fn waypoints_carry_no_category() {
        let raw = RawPoi {
            id: Some("w".into()),
            room_id: Some("hall".into()),
            category: Some("destination".into()),
            position: Some(Vec3::new(0.0, 0.0, 0.0).into()),
            ..RawPoi::default()
        };
        assert_eq!(validate_poi(&raw, false).unwrap().category, None);
    }

    #[test]
    fn poi_missing_fields_are_reported() {
        let mut raw = RawPoi {
            id: Some("  ".into()),
            room_id: Some("hall".into()),
            position: Some(Vec3::new(0.0, 0.0, 0.0).into()),
            ..RawPoi::default()
        };
        assert_eq!(validate_poi(&raw, true), Err(MalformedReason::MissingId));

        raw.id = Some("b".into());
        raw.room_id = None;
        assert_eq!(validate_poi(&raw, true), Err(MalformedReason::MissingRoom));

        raw.room_id = Some("hall".into());
        raw.position = Some(RawPosition {
            x: Some(1.0),
            y: None,
            z: Some(0.0),
        });
        assert_eq!(validate_poi(&raw, true), Err(MalformedReason::MissingPosition));

        raw.position = Some(Vec3::new(f32::NAN, 0.0, 0.0).into());
        assert_eq!(validate_poi(&raw, true), Err(MalformedReason::NonFinitePosition));
    }

    #[test]
    fn doorway_validation() {
        let mut raw = RawDoorway {
            id: Some("d".into()),
            position: Some(Vec3::new(0.0, 0.0, 0.0).into()),
            connects_rooms: Some(RawConnectsRooms {
                room_a: Some("a".into()),
                room_b: None,
            }),
            ..RawDoorway::default()
        };
        assert_eq!(
            validate_doorway(&raw),
            Err(MalformedReason::MissingConnectsRooms)
        );

        raw.connects_rooms = Some(RawConnectsRooms {
            room_a: Some("a".into()),
            room_b: Some("a".into()),
        });
        assert_eq!(validate_doorway(&raw), Err(MalformedReason::SelfLoopDoorway));

        raw.connects_rooms = Some(RawConnectsRooms {
            room_a: Some("a".into()),
            room_b: Some("b".into()),
        });
        let door = validate_doorway(&raw).unwrap();
        // No roomId: primary room is roomA.
        assert_eq!(door.room, RoomId::from("a"));
    }

    #[test]
    fn ids_and_rooms_are_kept_verbatim() {
        let raw = RawPoi {
            id: Some(" a ".into()),
            room_id: Some("hall ".into()),
            position: Some(Vec3::new(0.0, 0.0, 0.0).into()),
            ..RawPoi::default()
        };
        let poi = validate_poi(&raw, false).unwrap();
        assert_eq!(poi.key, " a ");
        assert_eq!(poi.name, " a ");
        assert_eq!(poi.room, RoomId::from("hall "));

        let door = validate_doorway(&RawDoorway {
            id: Some("d ".into()),
            position: Some(Vec3::new(0.0, 0.0, 0.0).into()),
            connects_rooms: Some(RawConnectsRooms {
                room_a: Some(" a".into()),
                room_b: Some("a".into()),
            }),
            ..RawDoorway::default()
        })
        .unwrap();
        assert_eq!(door.key, "d ");
        assert_eq!(door.room_a, RoomId::from(" a"));
        assert_eq!(door.room, RoomId::from(" a"));
    }
}
