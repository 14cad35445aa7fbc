//! Template filling against real workbooks

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use tempfile::tempdir;

use protocolo_infra::xlsx_template::{fill_template, SheetPatch};
use protocolo_types::{Error, TemplateError};

fn write_template(path: &Path, sheet_name: &str) {
    let mut workbook = Workbook::new();

    let cover = workbook.add_worksheet();
    cover.set_name("capa").unwrap();
    cover.write_string(0, 0, "Capa").unwrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).unwrap();
    let bold = Format::new().set_bold();
    let date = Format::new().set_num_format("dd/mm/yyyy");
    sheet.write_string_with_format(0, 0, "PROTOCOLO DE DEVOLUÇÃO", &bold).unwrap();
    sheet.write_string(10, 0, "Rota").unwrap();
    sheet.write_blank(11, 0, &bold).unwrap();
    sheet.write_string(11, 1, "placeholder").unwrap();
    sheet.write_blank(30, 1, &date).unwrap();

    workbook.save(path).unwrap();
}

fn cell(path: &Path, sheet: &str, row: u32, col: u32) -> Option<Data> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range.get_value((row, col)).cloned()
}

fn text(path: &Path, sheet: &str, row: u32, col: u32) -> Option<String> {
    match cell(path, sheet, row, col) {
        Some(Data::String(s)) => Some(s),
        _ => None,
    }
}

#[test]
fn test_fill_preserves_other_content() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("modelo.xlsx");
    let output = dir.path().join("saida.xlsx");
    write_template(&template, "protocolo");

    let mut patch = SheetPatch::new();
    patch.set_text(12, 1, "R-15");
    patch.set_text(12, 2, "4500");
    patch.set_text(13, 2, "4501");
    patch.set_text(25, 2, "Carlos");

    fill_template(&template, "protocolo", &patch, &output).unwrap();

    assert_eq!(text(&output, "protocolo", 11, 0).as_deref(), Some("R-15"));
    assert_eq!(text(&output, "protocolo", 11, 1).as_deref(), Some("4500"));
    assert_eq!(text(&output, "protocolo", 12, 1).as_deref(), Some("4501"));
    assert_eq!(text(&output, "protocolo", 24, 1).as_deref(), Some("Carlos"));

    // Untouched cells and sheets survive
    assert_eq!(
        text(&output, "protocolo", 0, 0).as_deref(),
        Some("PROTOCOLO DE DEVOLUÇÃO")
    );
    assert_eq!(text(&output, "protocolo", 10, 0).as_deref(), Some("Rota"));
    assert_eq!(text(&output, "capa", 0, 0).as_deref(), Some("Capa"));

    let workbook: Xlsx<_> = open_workbook(&output).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["capa".to_string(), "protocolo".to_string()]);

    // Template is left as it was
    assert_eq!(text(&template, "protocolo", 11, 1).as_deref(), Some("placeholder"));
}

#[test]
fn test_number_lands_in_formatted_cell() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("modelo.xlsx");
    let output = dir.path().join("saida.xlsx");
    write_template(&template, "protocolo");

    let mut patch = SheetPatch::new();
    patch.set_number(31, 2, 45292.0);
    fill_template(&template, "protocolo", &patch, &output).unwrap();

    let serial = match cell(&output, "protocolo", 30, 1) {
        Some(Data::Float(f)) => f,
        Some(Data::DateTime(dt)) => dt.as_f64(),
        other => panic!("unexpected cell {:?}", other),
    };
    assert_eq!(serial, 45292.0);
}

#[test]
fn test_missing_sheet() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("modelo.xlsx");
    write_template(&template, "outra");

    let err = fill_template(
        &template,
        "protocolo",
        &SheetPatch::new(),
        &dir.path().join("saida.xlsx"),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Template(TemplateError::MissingSheet(name)) if name == "protocolo"));
}

#[test]
fn test_missing_template() {
    let dir = tempdir().unwrap();
    let err = fill_template(
        &dir.path().join("nao_existe.xlsx"),
        "protocolo",
        &SheetPatch::new(),
        &dir.path().join("saida.xlsx"),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Template(TemplateError::NotFound(_))));
}

#[test]
fn test_not_a_workbook() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("modelo.xlsx");
    std::fs::write(&template, b"definitely not a zip").unwrap();

    let err = fill_template(
        &template,
        "protocolo",
        &SheetPatch::new(),
        &dir.path().join("saida.xlsx"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Template(TemplateError::Zip(_)) | Error::Io(_)
    ));
}
