use partslist_merge::MergeError;
use partslist_merge::config::Settings;

#[test]
fn keys_mirror_the_upstream_store() {
    let settings = Settings::from_toml_str(
        r#"
        TARGET_SHEET_NAME = "BOM"
        ROW_HEIGHT = 21.0
        TEMPLATE_SPREADSHEET_ID = "template-1"
        OUTPUT_FOLDER_ID = "/srv/merged"
        TIME_ZONE_OFFSET_HOURS = 9

        [COLUMN_NAMES]
        SUPPLIER = "Vendor"
        CATEGORY = "Kind"

        [COLUMN_WIDTHS]
        E = 180
        AB = 40
        "#,
    )
    .unwrap();

    assert_eq!(settings.target_sheet_name, "BOM");
    assert_eq!(settings.row_height, Some(21.0));
    assert_eq!(settings.template_spreadsheet_id.as_deref(), Some("template-1"));
    assert_eq!(settings.output_folder_id.as_deref(), Some("/srv/merged"));
    assert_eq!(settings.column_names.supplier, "Vendor");
    assert_eq!(settings.column_names.category, "Kind");
    assert_eq!(settings.column_names.unit, "Unit");
    assert_eq!(settings.column_widths["E"], 180);
    assert_eq!(settings.column_widths["AB"], 40);
    assert_eq!(settings.time_zone().local_minus_utc(), 9 * 3600);
}

#[test]
fn missing_keys_take_defaults() {
    let settings = Settings::from_toml_str("").unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.column_names.header_row().len(), 13);
}

#[test]
fn invalid_values_are_rejected() {
    let error = Settings::from_toml_str(r#"TARGET_SHEET_NAME = "  ""#).unwrap_err();
    assert!(matches!(error, MergeError::InvalidConfig(_)));

    let error = Settings::from_toml_str("TIME_ZONE_OFFSET_HOURS = 30").unwrap_err();
    assert!(matches!(error, MergeError::InvalidConfig(_)));

    let error = Settings::from_toml_str("ROW_HEIGHT = \"tall\"").unwrap_err();
    assert!(matches!(error, MergeError::ConfigParse(_)));
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "TARGET_SHEET_NAME = \"Sheet1\"\n").unwrap();

    assert_eq!(Settings::load(&path).unwrap().target_sheet_name, "Sheet1");
    assert!(matches!(
        Settings::load(&dir.path().join("absent.toml")),
        Err(MergeError::Io(_))
    ));
}
