use super::*;

#[test]
fn defaults() {
    let s = EngineSettings::default();
    assert_eq!(s.history_depth, 50);
    assert_eq!(s.handle_size_px, 10.0);
    assert_eq!(s.handle_hit_radius_px, 12.0);
    assert_eq!(s.rotate_handle_offset_px, 30.0);
    assert_eq!(s.min_scale, 0.01);
}

#[test]
fn history_depth_never_zero() {
    assert_eq!(EngineSettings::default().with_history_depth(0).history_depth, 1);
    assert_eq!(EngineSettings::default().with_history_depth(7).history_depth, 7);
}

#[test]
fn partial_json_keeps_defaults() {
    let s: EngineSettings =
        serde_json::from_str(r##"{ "history_depth": 5, "chrome_color": "#ff0000" }"##).unwrap();
    assert_eq!(s.history_depth, 5);
    assert_eq!(s.chrome_color, Color::rgb(255, 0, 0));
    assert_eq!(s.handle_size_px, 10.0);
}

#[test]
fn env_parsing_ignores_garbage() {
    assert_eq!(env_parse::<usize>("LAYERCRAFT_TEST_UNSET_KEY"), None);
    assert_eq!(env_positive_f64("LAYERCRAFT_TEST_UNSET_KEY"), None);
}
