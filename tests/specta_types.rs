//! Type export tests
//!
//! Validates that the public value types implement `specta::Type` when the
//! tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_value_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, the types are exportable to TypeScript.
    fn assert_type<T: Type>() {}

    assert_type::<simview::Sample>();
    assert_type::<simview::Value>();
    assert_type::<simview::VariableDescriptor>();
    assert_type::<simview::VariableType>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let _ = simview::VariableType::Float32.size();
}
