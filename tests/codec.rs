use mapforge::catalog::TerrainKind;
use mapforge::codec::{self, CodecError};
use mapforge::grid::{Coord, GridState};

// A file in the exact shape the browser editor used to download.
const LEGACY_SAVE: &str = r#"{
  "rows": 10,
  "cols": 10,
  "tiles": {
    "0,0": "field",
    "0,1": "field+crop",
    "2,3": "forest",
    "4,4": "mountain+metal",
    "9,9": "ocean"
  },
  "cities": [
    {"id": 1, "row": 0, "col": 0, "expanded": false},
    {"id": 2, "row": 5, "col": 5, "expanded": true}
  ]
}"#;

#[test]
fn legacy_saves_load_unchanged() {
    let loaded = codec::deserialize(LEGACY_SAVE).expect("legacy file parses");
    let grid = &loaded.grid;

    assert_eq!(grid.rows(), 10);
    assert_eq!(grid.cols(), 10);
    assert_eq!(grid.terrain_at(Coord::new(0, 1)), TerrainKind::FieldCrop);
    assert_eq!(grid.terrain_at(Coord::new(4, 4)), TerrainKind::MountainMetal);
    assert_eq!(grid.cities().len(), 2);
    assert!(grid.city_at(Coord::new(5, 5)).expect("city parsed").expanded);
    assert_eq!(loaded.next_city_id, 3);
}

#[test]
fn round_trip_reproduces_an_equal_grid() {
    let mut grid = GridState::new(7, 5);
    grid.set_terrain(Coord::new(0, 0), TerrainKind::Field);
    grid.set_terrain(Coord::new(6, 4), TerrainKind::Ocean);
    grid.set_terrain(Coord::new(3, 2), TerrainKind::Forest);
    grid.toggle_city(Coord::new(1, 1), 1);
    grid.toggle_city(Coord::new(4, 4), 2);
    grid.toggle_expansion(Coord::new(4, 4));

    let text = codec::serialize(&grid);
    let loaded = codec::deserialize(&text).expect("own output parses");
    assert_eq!(loaded.grid, grid);
    assert_eq!(loaded.next_city_id, 3);

    // Only the map itself round-trips; nothing of the overlay is written.
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
    let object = value.as_object().expect("top-level object");
    assert_eq!(object.len(), 4);
    for key in ["rows", "cols", "tiles", "cities"] {
        assert!(object.contains_key(key), "{key} should be serialized");
    }
}

#[test]
fn serialized_output_uses_the_same_shape() {
    let mut grid = GridState::new(3, 4);
    grid.set_terrain(Coord::new(1, 2), TerrainKind::Forest);
    grid.toggle_city(Coord::new(0, 0), 1);

    let text = codec::serialize(&grid);
    let value: serde_json::Value = serde_json::from_str(&text).expect("output is JSON");

    assert_eq!(value["rows"], 3);
    assert_eq!(value["cols"], 4);
    assert_eq!(value["tiles"]["1,2"], "forest");
    assert_eq!(value["cities"][0]["id"], 1);
    assert_eq!(value["cities"][0]["expanded"], false);
}

#[test]
fn stored_empty_entries_are_dropped_on_load() {
    let text = r#"{
        "rows": 3,
        "cols": 3,
        "tiles": {"0,0": "empty", "1,1": "water"},
        "cities": []
    }"#;
    let loaded = codec::deserialize(text).expect("file parses");
    assert_eq!(loaded.grid.tiles().len(), 1);
    assert_eq!(loaded.grid.terrain_at(Coord::new(1, 1)), TerrainKind::Water);
}

#[test]
fn cityless_maps_start_the_counter_at_one() {
    let text = r#"{"rows": 2, "cols": 2, "tiles": {}, "cities": []}"#;
    let loaded = codec::deserialize(text).expect("file parses");
    assert_eq!(loaded.next_city_id, 1);
}

#[test]
fn malformed_documents_are_rejected() {
    assert!(matches!(
        codec::deserialize("not json"),
        Err(CodecError::Parse(_))
    ));
    assert!(matches!(
        codec::deserialize(r#"{"rows": 2, "cols": 2, "tiles": {"oops": "field"}, "cities": []}"#),
        Err(CodecError::TileKey(_))
    ));
    assert!(matches!(
        codec::deserialize(r#"{"rows": 0, "cols": 2, "tiles": {}, "cities": []}"#),
        Err(CodecError::Dimensions)
    ));
    assert!(codec::deserialize(
        r#"{"rows": 2, "cols": 2, "tiles": {"0,0": "lava"}, "cities": []}"#
    )
    .is_err());
}

#[test]
fn duplicate_cities_are_rejected() {
    let duplicate_id = r#"{
        "rows": 3, "cols": 3, "tiles": {},
        "cities": [
            {"id": 1, "row": 0, "col": 0, "expanded": false},
            {"id": 1, "row": 1, "col": 1, "expanded": false}
        ]
    }"#;
    assert!(matches!(
        codec::deserialize(duplicate_id),
        Err(CodecError::DuplicateCityId(1))
    ));

    let shared_tile = r#"{
        "rows": 3, "cols": 3, "tiles": {},
        "cities": [
            {"id": 1, "row": 2, "col": 2, "expanded": false},
            {"id": 2, "row": 2, "col": 2, "expanded": true}
        ]
    }"#;
    assert!(matches!(
        codec::deserialize(shared_tile),
        Err(CodecError::CityCollision(2, 2))
    ));

    let zero_id = r#"{
        "rows": 3, "cols": 3, "tiles": {},
        "cities": [{"id": 0, "row": 0, "col": 0, "expanded": false}]
    }"#;
    assert!(matches!(
        codec::deserialize(zero_id),
        Err(CodecError::CityId)
    ));
}

#[test]
fn the_largest_city_id_is_rejected() {
    // u32::MAX passes every other check but leaves no id for the next city;
    // the counter repair must reject it rather than wrap.
    let spent = r#"{
        "rows": 3, "cols": 3, "tiles": {},
        "cities": [{"id": 4294967295, "row": 0, "col": 0, "expanded": false}]
    }"#;
    assert!(matches!(
        codec::deserialize(spent),
        Err(CodecError::CityIdRange(u32::MAX))
    ));

    // One id of headroom still loads; the counter lands on the final id.
    let almost = r#"{
        "rows": 3, "cols": 3, "tiles": {},
        "cities": [{"id": 4294967294, "row": 0, "col": 0, "expanded": false}]
    }"#;
    let loaded = codec::deserialize(almost).expect("one id of headroom loads");
    assert_eq!(loaded.next_city_id, u32::MAX);
}

#[test]
fn out_of_bounds_entries_survive_a_round_trip() {
    let text = r#"{
        "rows": 3,
        "cols": 3,
        "tiles": {"8,8": "forest"},
        "cities": []
    }"#;
    let loaded = codec::deserialize(text).expect("dormant tiles are legal");
    assert_eq!(loaded.grid.terrain_at(Coord::new(8, 8)), TerrainKind::Forest);

    let reserialized = codec::serialize(&loaded.grid);
    let value: serde_json::Value = serde_json::from_str(&reserialized).expect("valid JSON");
    assert_eq!(value["tiles"]["8,8"], "forest");
}
