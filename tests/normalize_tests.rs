//! Layout normalization unit tests

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use town_sync::normalize::normalize_layout;
    use town_sync::types::CATEGORIES;

    fn category_keys(snapshot_json: &Value) -> Vec<&str> {
        CATEGORIES
            .iter()
            .copied()
            .filter(|c| snapshot_json.get(c).map(Value::is_array) == Some(true))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Canonical shape – all eight categories, always
    // -----------------------------------------------------------------------

    #[test]
    fn map_input_yields_all_categories() {
        let layout = json!({
            "buildings": [{"model": "house", "position": [1.0, 0.0, 2.0]}],
        });
        let snapshot = normalize_layout(&layout);
        let as_json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(category_keys(&as_json).len(), 8);
        assert_eq!(snapshot.buildings.len(), 1);
        assert!(snapshot.roads.is_empty());
    }

    #[test]
    fn garbage_input_yields_empty_categories() {
        for layout in [json!(null), json!(42), json!("town")] {
            let snapshot = normalize_layout(&layout);
            let as_json = serde_json::to_value(&snapshot).unwrap();
            assert_eq!(category_keys(&as_json).len(), 8);
            assert_eq!(snapshot.object_count(), 0);
        }
    }

    // -----------------------------------------------------------------------
    // Flat-list shape
    // -----------------------------------------------------------------------

    #[test]
    fn list_input_buckets_by_category_tag() {
        let layout = json!([
            {"category": "trees", "modelName": "oak", "position": [3.0, 0.0, 4.0]},
            {"category": "trees", "modelName": "pine"},
            {"category": "vehicles", "model": "car"},
            {"category": "castles", "model": "keep"},  // unknown – dropped
            "not a record",
        ]);
        let snapshot = normalize_layout(&layout);

        assert_eq!(snapshot.trees.len(), 2);
        assert_eq!(snapshot.vehicles.len(), 1);
        assert_eq!(snapshot.object_count(), 3);
        assert_eq!(snapshot.trees[0].model.as_deref(), Some("oak"));
        assert_eq!(snapshot.trees[0].position.x, 3.0);
        assert_eq!(snapshot.trees[0].position.z, 4.0);
    }

    // -----------------------------------------------------------------------
    // Field mapping and defaults
    // -----------------------------------------------------------------------

    #[test]
    fn model_name_alias_and_vector_defaults() {
        let layout = json!({
            "props": [{"modelName": "bench"}],
        });
        let snapshot = normalize_layout(&layout);
        let bench = &snapshot.props[0];

        assert_eq!(bench.model.as_deref(), Some("bench"));
        assert_eq!(bench.category, "props");
        assert_eq!(bench.position.x, 0.0);
        assert_eq!(bench.scale.x, 1.0);
    }

    #[test]
    fn accepts_map_vectors_with_partial_components() {
        let layout = json!({
            "street": [{"model": "lamp", "position": {"x": 7.5}, "scale": {"y": 2.0}}],
        });
        let lamp = &normalize_layout(&layout).street[0];

        assert_eq!(lamp.position.x, 7.5);
        assert_eq!(lamp.position.y, 0.0);
        assert_eq!(lamp.scale.x, 1.0);
        assert_eq!(lamp.scale.y, 2.0);
    }

    // -----------------------------------------------------------------------
    // Verbatim passthrough
    // -----------------------------------------------------------------------

    #[test]
    fn preserves_extra_top_level_and_item_keys() {
        let layout = json!({
            "townName": "Riverton",
            "history": [{"who": "alice"}],
            "vehicles": [{"model": "car", "driver": "bob", "id": "v1"}],
        });
        let snapshot = normalize_layout(&layout);

        assert_eq!(snapshot.extra["townName"], json!("Riverton"));
        assert_eq!(snapshot.extra["history"], json!([{"who": "alice"}]));

        let car = &snapshot.vehicles[0];
        assert_eq!(car.id.as_deref(), Some("v1"));
        assert_eq!(car.extra["driver"], json!("bob"));
    }

    #[test]
    fn non_string_id_and_model_are_kept_in_extra() {
        let layout = json!({
            "vehicles": [{"id": 42, "model": 7, "modelName": "car"}],
        });
        let snapshot = normalize_layout(&layout);
        let car = &snapshot.vehicles[0];

        // The typed fields only hold strings; any other shape must still
        // reach the serialized object under its original key.
        assert_eq!(car.id, None);
        assert_eq!(car.extra["id"], json!(42));
        assert_eq!(car.extra["model"], json!(7));

        let as_json = serde_json::to_value(car).unwrap();
        assert_eq!(as_json["id"], json!(42));
        assert_eq!(as_json["model"], json!(7));
        assert_eq!(as_json["modelName"], json!("car"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let layout = json!({
            "townName": "Riverton",
            "buildings": [{"modelName": "house", "position": [1.0, 2.0, 3.0]}],
        });
        let once = normalize_layout(&layout);
        let twice = normalize_layout(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }
}
