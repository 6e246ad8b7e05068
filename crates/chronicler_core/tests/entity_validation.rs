use chronicler_core::{
    BreakConcentrationRequest, BreakReason, ConcentrationState, Region, ValidationError, World,
};

#[test]
fn world_requires_positive_dimensions() {
    let flat = World::with_id("world-1", "Flat", 1, 0, 10);
    assert!(matches!(
        flat.validate(),
        Err(ValidationError::OutOfRange { field: "width", .. })
    ));

    let thin = World::with_id("world-1", "Thin", 1, 10, 0);
    assert!(matches!(
        thin.validate(),
        Err(ValidationError::OutOfRange { field: "height", .. })
    ));
}

#[test]
fn world_rejects_blank_name_and_malformed_id() {
    let unnamed = World::with_id("world-1", "   ", 1, 10, 10);
    assert!(matches!(
        unnamed.validate(),
        Err(ValidationError::MissingField { field: "name", .. })
    ));

    let bad_id = World::with_id("no spaces allowed", "Aeldran", 1, 10, 10);
    assert!(matches!(
        bad_id.validate(),
        Err(ValidationError::MalformedId { field: "id", .. })
    ));
}

#[test]
fn world_accepts_recognized_and_custom_environment_keys() {
    let mut world = World::with_id("world-1", "Aeldran", 1, 10, 10);
    world
        .environment
        .insert("weather".to_string(), "storm".to_string());
    world
        .environment
        .insert("moon_phase".to_string(), "waning".to_string());
    assert!(world.validate().is_ok());
}

#[test]
fn region_requires_rrggbb_color() {
    let mut region = Region::with_id("r-1", "w-1", "Mistwood", "forest", 0.0, 0.0, "#2F6B3C");
    assert!(region.validate().is_ok());

    region.color = "forest-green".to_string();
    assert!(matches!(
        region.validate(),
        Err(ValidationError::InvalidValue { field: "color", .. })
    ));
}

#[test]
fn region_validates_owner_reference_when_present() {
    let mut region = Region::with_id("r-1", "w-1", "Mistwood", "forest", 0.0, 0.0, "#2F6B3C");
    region.owner_nation_id = Some("nation veyra".to_string());
    assert!(matches!(
        region.validate(),
        Err(ValidationError::MalformedId {
            field: "ownerNationId",
            ..
        })
    ));
}

#[test]
fn region_rejects_non_finite_centroids() {
    let region = Region::with_id("r-1", "w-1", "Edge", "void", f64::NAN, 0.0, "#000000");
    assert!(matches!(
        region.validate(),
        Err(ValidationError::OutOfRange {
            field: "centroid",
            ..
        })
    ));
}

#[test]
fn concentration_state_bounds_spell_level_and_dc() {
    let mut state = ConcentrationState::new("char-1", "bless", 1, 3);
    assert!(state.validate().is_ok());

    state.spell_level = 10;
    assert!(matches!(
        state.validate(),
        Err(ValidationError::OutOfRange {
            field: "spellLevel",
            ..
        })
    ));

    state.spell_level = 9;
    state.save_dc_base = 0;
    assert!(matches!(
        state.validate(),
        Err(ValidationError::OutOfRange {
            field: "saveDcBase",
            ..
        })
    ));

    state.save_dc_base = 10;
    state.max_duration_rounds = Some(0);
    assert!(matches!(
        state.validate(),
        Err(ValidationError::OutOfRange {
            field: "maxDurationRounds",
            ..
        })
    ));
}

#[test]
fn break_request_for_damage_requires_amount_and_roll() {
    let mut request = BreakConcentrationRequest::new("char-1", BreakReason::Damage);
    assert!(matches!(
        request.validate(),
        Err(ValidationError::MissingField {
            field: "damageAmount",
            ..
        })
    ));

    request.damage_amount = Some(12);
    assert!(matches!(
        request.validate(),
        Err(ValidationError::MissingField {
            field: "saveRoll",
            ..
        })
    ));

    request.save_roll = Some(21);
    assert!(matches!(
        request.validate(),
        Err(ValidationError::OutOfRange {
            field: "saveRoll",
            ..
        })
    ));

    request.save_roll = Some(20);
    assert!(request.validate().is_ok());

    request.damage_amount = Some(0);
    assert!(matches!(
        request.validate(),
        Err(ValidationError::OutOfRange {
            field: "damageAmount",
            ..
        })
    ));
}

#[test]
fn break_request_for_duration_requires_current_round() {
    let mut request = BreakConcentrationRequest::new("char-1", BreakReason::Duration);
    assert!(matches!(
        request.validate(),
        Err(ValidationError::MissingField {
            field: "currentRound",
            ..
        })
    ));

    request.current_round = Some(7);
    assert!(request.validate().is_ok());
}

#[test]
fn break_request_uses_camel_case_wire_names() {
    let parsed: BreakConcentrationRequest = serde_json::from_str(
        r#"{
            "characterId": "char-1",
            "reason": "damage",
            "damageAmount": 18,
            "saveRoll": 11
        }"#,
    )
    .unwrap();

    assert_eq!(parsed.character_id, "char-1");
    assert_eq!(parsed.reason, BreakReason::Damage);
    assert_eq!(parsed.damage_amount, Some(18));
    assert_eq!(parsed.constitution_modifier, 0);
    assert!(parsed.validate().is_ok());
}

#[test]
fn region_serializes_kind_as_type() {
    let region = Region::with_id("r-1", "w-1", "Mistwood", "forest", 0.0, 0.0, "#2F6B3C");
    let json = serde_json::to_value(&region).unwrap();
    assert_eq!(json["type"], "forest");
    assert_eq!(json["worldId"], "w-1");
    assert!(json.get("kind").is_none());
}
