//! Spreadsheet export

mod excel;

pub use excel::{
    build_template_patch, excel_serial, export_table, fill_template, ExportedFile, TABLE_HEADERS,
    TABLE_OUTPUT, TEMPLATE_OUTPUT, TEMPLATE_SHEET, XLSX_MIME,
};
