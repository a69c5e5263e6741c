use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CanvasError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(CanvasError::render("x").to_string().contains("render error:"));
    assert!(
        CanvasError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(CanvasError::export("x").to_string().contains("export error:"));
    assert!(
        CanvasError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CanvasError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let err: CanvasError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, CanvasError::Serde(_)));
}
