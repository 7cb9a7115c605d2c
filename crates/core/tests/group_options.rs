use blindsops_core::differ::{SheetStatus, FLEX_MARKER, NO_CHANGES_SHEET};
use blindsops_core::{sync_group_options, GroupOptionsConfig, ReconConfig, SqliteInventory};
use blindsops_sheet::{Book, CellValue, Sheet};
use rusqlite::Connection;
use std::path::Path;
use tempfile::tempdir;

fn create_inventory(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        r"
        CREATE TABLE inventory_items (
            inventory_group_code TEXT,
            Code TEXT,
            DescnPart1 TEXT,
            DescnPart2 TEXT,
            DescnPart3 TEXT,
            Active TEXT
        );
        INSERT INTO inventory_items VALUES
            ('ROLL', 'RB001', 'Sanctuary Blockout', 'Blockout', 'White', '1'),
            ('ROLL', 'RB003', 'Vibe', 'Blockout', 'Sand', '1'),
            ('ROLL', 'RS001', 'Vibe', 'Screen', 'Sand', '1'),
            ('WSROLL', 'WB001', 'Vibe', 'Blockout', 'Sand', '1');
        ",
    )
    .unwrap();
}

fn upload_sheet(config: &GroupOptionsConfig, names: &[&str], triples: &[&str]) -> Sheet {
    let mut sheet = Sheet::new();
    sheet.set_cell(1, 1, "Option Set").unwrap();
    sheet.set_cell(1, 2, &config.name_header).unwrap();
    sheet.set_cell(1, 3, &config.triple_header).unwrap();
    for (i, name) in names.iter().enumerate() {
        sheet.set_cell(config.start_row + i, 2, *name).unwrap();
    }
    for (i, triple) in triples.iter().enumerate() {
        sheet.set_cell(config.start_row + i, 3, *triple).unwrap();
    }
    sheet
}

#[test]
fn test_sync_round_trip_converges() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("inventory.db");
    let upload_path = dir.path().join("upload.xlsx");
    let output_path = dir.path().join("upload_corrected.xlsx");
    create_inventory(&db_path);

    let config = ReconConfig::from_yaml_str("group_options:\n  start_row: 5\n")
        .unwrap()
        .group_options;
    let mut upload = Book::new();
    upload
        .add_sheet("ROLLCB", upload_sheet(&config, &["Vibe"], &["Vibe|Sand|RB003"]))
        .unwrap();
    upload
        .add_sheet(
            "ROLLFLEX",
            upload_sheet(&config, &["YES|Vibe"], &["Vibe|Sand|RB003"]),
        )
        .unwrap();
    upload
        .add_sheet(
            "WSROLLCB",
            upload_sheet(&config, &["Vibe"], &["VIBE | sand | WB001"]),
        )
        .unwrap();
    upload.save_as_xlsx(&upload_path).unwrap();

    let store = SqliteInventory::open_path(&db_path).unwrap();
    let input = Book::from_xlsx(&upload_path).unwrap();
    let out = sync_group_options(&input, &store, &config).unwrap();

    assert_eq!(out.book.sheet_names(), vec!["ROLLCB", "ROLLFLEX"]);
    assert_eq!(out.report.sheets["WSROLLCB"], SheetStatus::Unchanged { names: 1, triples: 1 });
    assert_eq!(out.report.sheets["WSROLLFLEX"], SheetStatus::MissingInInput);

    let flex = out.book.get_sheet("ROLLFLEX").unwrap();
    assert_eq!(
        flex.cell(config.start_row, 2),
        &CellValue::from(format!("{FLEX_MARKER}Sanctuary Blockout"))
    );
    assert_eq!(flex.cell(config.start_row + 1, 2), &CellValue::from("YES|Vibe"));
    assert_eq!(flex.cell(1, 1), &CellValue::from("Option Set"));
    out.book.save_as_xlsx(&output_path).unwrap();

    let corrected = Book::from_xlsx(&output_path).unwrap();
    let again = sync_group_options(&corrected, &store, &config).unwrap();
    assert_eq!(again.report.changed_count(), 0);
    assert_eq!(again.book.sheet_names(), vec![NO_CHANGES_SHEET]);
}

#[test]
fn test_missing_headers_do_not_stop_other_sheets() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("inventory.db");
    create_inventory(&db_path);
    let store = SqliteInventory::open_path(&db_path).unwrap();
    let config = GroupOptionsConfig::default();

    let mut input = Book::new();
    input
        .add_sheet("ROLLCB", Sheet::from_data(vec![vec!["Nothing", "Here"]]))
        .unwrap();
    input
        .add_sheet("WSROLLCB", upload_sheet(&config, &[], &[]))
        .unwrap();

    let out = sync_group_options(&input, &store, &config).unwrap();
    let failures: Vec<(&str, &str)> = out.report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "ROLLCB");
    assert!(failures[0].1.contains("BLOCKOUTFABRIC / BLOCKOUTFABRICCOLOUR"));

    let ws = out.book.get_sheet("WSROLLCB").unwrap();
    assert_eq!(ws.cell(config.start_row, 3), &CellValue::from("Vibe|Sand|WB001"));
}
