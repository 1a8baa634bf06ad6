use super::*;
use crate::form::ChoiceGroup;
use shared::form::{ControlDescriptor, ControlKind, FormDescription};

fn color_presets(selected: Option<&str>) -> ChoiceGroup {
    let group = ChoiceGroup::new(["red", "rainbow", "other"]);
    match selected {
        Some(value) => group.with_selected(value),
        None => group,
    }
}

#[test]
fn anim_form_scenario_yields_number_and_normalized_color() {
    let form = Form::builder("anim-form")
        .range("speed", "5")
        .color("hue", "#ffffff")
        .build();

    let values = collect_values(&form, &["speed", "hue"])
        .into_complete()
        .expect("complete extraction");

    assert_eq!(
        serde_json::to_value(&values).expect("json"),
        serde_json::json!({"speed": 5, "hue": "255,255,255"})
    );
}

#[test]
fn hex_to_rgb_converts_each_channel() {
    assert_eq!(hex_to_rgb("#1a2b3c"), "26,43,60");
    assert_eq!(hex_to_rgb("1A2B3C"), "26,43,60");
    assert_eq!(hex_to_rgb("#000000"), "0,0,0");
}

#[test]
fn hex_to_rgb_falls_back_to_white() {
    for input in ["", "#fff", "#1a2b3c4", "##1a2b3c", "#1a2b3g", "+1+2+3", "#1a 2b3"] {
        assert_eq!(hex_to_rgb(input), FALLBACK_RGB, "input {input:?}");
    }
}

#[test]
fn override_selection_beats_color_value() {
    let form = Form::builder("settings_table")
        .color("color", "#1a2b3c")
        .override_group("color", color_presets(Some("rainbow")))
        .build();

    let extraction = collect_values(&form, &["color"]);
    assert_eq!(
        extraction.values.get("color"),
        Some(&CommandValue::Text("rainbow".into()))
    );
}

#[test]
fn other_selection_defers_to_converted_color() {
    let form = Form::builder("settings_table")
        .color("color", "#1a2b3c")
        .override_group("color", color_presets(Some("other")))
        .build();

    let extraction = collect_values(&form, &["color"]);
    assert_eq!(
        extraction.values.get("color"),
        Some(&CommandValue::Text("26,43,60".into()))
    );
}

#[test]
fn unselected_override_defers_to_base() {
    let form = Form::builder("settings_table")
        .color("color", "#ff0000")
        .override_group("color", color_presets(None))
        .build();

    let extraction = collect_values(&form, &["color"]);
    assert_eq!(
        extraction.values.get("color"),
        Some(&CommandValue::Text("255,0,0".into()))
    );
}

#[test]
fn override_without_base_uses_selection_verbatim() {
    let form = Form::builder("settings_table")
        .override_group("direction", ChoiceGroup::new(["up", "down"]).with_selected("down"))
        .override_group("palette", color_presets(Some("other")))
        .build();

    let values = collect_values(&form, &["direction", "palette"])
        .into_complete()
        .expect("complete");
    assert_eq!(values.get("direction"), Some(&CommandValue::Text("down".into())));
    assert_eq!(values.get("palette"), Some(&CommandValue::Text("other".into())));
}

#[test]
fn toggles_choices_and_text_extract_by_kind() {
    let form = Form::builder("led_table")
        .toggle("power", true)
        .toggle("state", false)
        .choice("mode", ChoiceGroup::new(["a", "b"]).with_selected("b"))
        .text("name", "fade")
        .range("brightness", "0.25")
        .build();

    let values = collect_values(&form, &["power", "state", "mode", "name", "brightness"])
        .into_complete()
        .expect("complete");

    assert_eq!(values.get("power"), Some(&CommandValue::Bool(true)));
    assert_eq!(values.get("state"), Some(&CommandValue::Bool(false)));
    assert_eq!(values.get("mode"), Some(&CommandValue::Text("b".into())));
    assert_eq!(values.get("name"), Some(&CommandValue::Text("fade".into())));
    assert_eq!(values.get("brightness"), Some(&CommandValue::Float(0.25)));
}

#[test]
fn missing_controls_are_reported_not_skipped() {
    let form = Form::builder("anim-form").range("speed", "5").build();

    let extraction = collect_values(&form, &["speed", "hue"]);
    assert!(!extraction.is_complete());
    assert!(extraction.values.contains("speed"));
    assert_eq!(
        extraction.issues,
        vec![ExtractIssue::Missing { name: "hue".into() }]
    );

    let err = extraction.into_complete().expect_err("incomplete");
    assert!(matches!(err, ClientError::Extraction { ref issues, .. } if issues.len() == 1));
}

#[test]
fn choice_without_selection_is_an_issue() {
    let form = Form::builder("f")
        .choice("mode", ChoiceGroup::new(["a", "b"]))
        .build();

    let extraction = collect_values(&form, &["mode"]);
    assert_eq!(
        extraction.issues,
        vec![ExtractIssue::NoSelection { name: "mode".into() }]
    );
}

#[test]
fn unparsable_range_is_an_issue() {
    let form = Form::builder("f").range("speed", "fast").build();

    let extraction = collect_values(&form, &["speed"]);
    assert!(extraction.values.is_empty());
    assert_eq!(extraction.issues[0].name(), "speed");
}

#[test]
fn parse_number_follows_browser_number_rules() {
    assert_eq!(parse_number(""), Some(CommandValue::Integer(0)));
    assert_eq!(parse_number(" 7 "), Some(CommandValue::Integer(7)));
    assert_eq!(parse_number("-3"), Some(CommandValue::Integer(-3)));
    assert_eq!(parse_number("2.0"), Some(CommandValue::Integer(2)));
    assert_eq!(parse_number("0.5"), Some(CommandValue::Float(0.5)));
    assert_eq!(parse_number("1e2"), Some(CommandValue::Integer(100)));
    assert_eq!(parse_number("NaN"), None);
    assert_eq!(parse_number("inf"), None);
}

#[test]
fn extracting_twice_yields_identical_values() {
    let description = FormDescription {
        id: "settings_table".into(),
        controls: vec![
            ControlDescriptor::new("name", ControlKind::Other, "fade"),
            ControlDescriptor::new("speed", ControlKind::Range, "1.5"),
            ControlDescriptor::new("mirror", ControlKind::Checkbox, "").checked(true),
            ControlDescriptor::new("drop-down_color", ControlKind::Radio, "red"),
            ControlDescriptor::new("drop-down_color", ControlKind::Radio, "other").checked(true),
            ControlDescriptor::new("color", ControlKind::Color, "#102030"),
            ControlDescriptor::new("drop-down_shape", ControlKind::Radio, "ring").checked(true),
        ],
    };
    let form = Form::from_description(&description);
    let names = ["name", "speed", "mirror", "color", "shape"];

    let first = collect_values(&form, &names);
    let second = collect_values(&form, &names);

    assert!(first.is_complete());
    assert_eq!(first, second);
    assert_eq!(
        first.values.get("color"),
        Some(&CommandValue::Text("16,32,48".into()))
    );
    assert_eq!(first.values.get("shape"), Some(&CommandValue::Text("ring".into())));
}

#[test]
fn ui_mutation_changes_the_next_extraction() {
    let mut form = Form::builder("settings_table")
        .color("color", "#1a2b3c")
        .override_group("color", color_presets(Some("other")))
        .build();

    let before = collect_values(&form, &["color"]);

    let group = form
        .control_mut("color")
        .and_then(|control| control.override_group.as_mut())
        .expect("override group");
    assert!(group.select("red"));

    let after = collect_values(&form, &["color"]);
    assert_ne!(before, after);
    assert_eq!(after.values.get("color"), Some(&CommandValue::Text("red".into())));
}
