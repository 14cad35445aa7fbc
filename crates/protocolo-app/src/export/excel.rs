//! Excel export functionality

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, XlsxError};
use serde::Serialize;

use protocolo_domain::model::ProtocolRecord;
use protocolo_infra::xlsx_template::{self, SheetPatch};
use protocolo_types::{Error, Result};

/// Sheet the template must contain
pub const TEMPLATE_SHEET: &str = "protocolo";

/// Single-record export, filled from the template
pub const TEMPLATE_OUTPUT: &str = "Protocolo_de_Entregas_Atualizado.xlsx";

/// Full-table export
pub const TABLE_OUTPUT: &str = "Registros_Exportados.xlsx";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const TABLE_HEADERS: [&str; 9] = [
    "ID",
    "Rota",
    "Motorista",
    "Transportadora",
    "Pedido",
    "Remessa",
    "Nota Fiscal",
    "Motivo",
    "Data",
];

/// A written export, ready to be offered for download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub file_name: &'static str,
    pub mime: &'static str,
}

impl ExportedFile {
    fn new(dir: &Path, file_name: &'static str) -> Self {
        Self {
            path: dir.join(file_name),
            file_name,
            mime: XLSX_MIME,
        }
    }
}

/// One printed copy of the protocol on the template page (1-based coordinates)
struct TemplateBlock {
    route: (u32, u32),
    order_col: u32,
    shipment_col: u32,
    invoice_col: u32,
    driver: (u32, u32),
    carrier: (u32, u32),
    date: (u32, u32),
}

/// First row of the route and order/shipment/invoice lists
const LIST_START_ROW: u32 = 12;

/// Two copies side by side: A..D and I..L
const TEMPLATE_BLOCKS: [TemplateBlock; 2] = [
    TemplateBlock {
        route: (12, 1),   // A12
        order_col: 2,     // B
        shipment_col: 3,  // C
        invoice_col: 4,   // D
        driver: (25, 2),  // B25
        carrier: (27, 3), // C27
        date: (31, 2),    // B31
    },
    TemplateBlock {
        route: (12, 9),    // I12
        order_col: 10,     // J
        shipment_col: 11,  // K
        invoice_col: 12,   // L
        driver: (25, 10),  // J25
        carrier: (27, 11), // K27
        date: (31, 9),     // I31
    },
];

/// Calendar date as an Excel date. Years outside 1900..=9999 are rejected.
fn excel_date(date: NaiveDate) -> Result<ExcelDateTime> {
    let year = u16::try_from(date.year())
        .map_err(|_| Error::Excel(format!("date {} is out of Excel's range", date)))?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).map_err(excel_error)
}

/// Excel serial day number (1900 date system, including its phantom 1900-02-29)
pub fn excel_serial(date: NaiveDate) -> Result<f64> {
    Ok(excel_date(date)?.to_excel())
}

fn set_text_or_blank(patch: &mut SheetPatch, (row, col): (u32, u32), value: &str) {
    if value.is_empty() {
        patch.set_blank(row, col);
    } else {
        patch.set_text(row, col, value);
    }
}

fn set_list(patch: &mut SheetPatch, col: u32, parts: &[String]) {
    for (offset, part) in parts.iter().enumerate() {
        set_text_or_blank(patch, (LIST_START_ROW + offset as u32, col), part);
    }
}

/// Cell writes for the template. Records are applied in order over the same
/// anchors, so with several records the last one wins wherever they overlap.
pub fn build_template_patch(records: &[ProtocolRecord]) -> Result<SheetPatch> {
    let mut patch = SheetPatch::new();

    for record in records {
        let orders = record.order_parts();
        let shipments = record.shipment_parts();
        let invoices = record.invoice_parts();

        for block in &TEMPLATE_BLOCKS {
            set_text_or_blank(&mut patch, block.route, &record.route);
            set_list(&mut patch, block.order_col, &orders);
            set_list(&mut patch, block.shipment_col, &shipments);
            set_list(&mut patch, block.invoice_col, &invoices);
            set_text_or_blank(&mut patch, block.driver, &record.driver);
            set_text_or_blank(&mut patch, block.carrier, &record.carrier);

            let (row, col) = block.date;
            match record.registered_on {
                Some(date) => patch.set_number(row, col, excel_serial(date)?),
                None => patch.set_blank(row, col),
            }
        }
    }

    Ok(patch)
}

/// Fill the protocol template and save it as [`TEMPLATE_OUTPUT`] in `output_dir`
pub fn fill_template(
    records: &[ProtocolRecord],
    template: &Path,
    output_dir: &Path,
) -> Result<ExportedFile> {
    if records.len() > 1 {
        log::warn!(
            "Template holds one protocol; {} records given, only the last is kept intact",
            records.len()
        );
    }

    let exported = ExportedFile::new(output_dir, TEMPLATE_OUTPUT);
    let patch = build_template_patch(records)?;
    xlsx_template::fill_template(template, TEMPLATE_SHEET, &patch, &exported.path)?;

    log::info!("Exported protocol sheet to {}", exported.path.display());
    Ok(exported)
}

fn excel_error(e: XlsxError) -> Error {
    Error::Excel(e.to_string())
}

/// Export every record as a flat table and save it as [`TABLE_OUTPUT`] in `output_dir`
pub fn export_table(records: &[ProtocolRecord], output_dir: &Path) -> Result<ExportedFile> {
    let exported = ExportedFile::new(output_dir, TABLE_OUTPUT);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Registros").map_err(excel_error)?;

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");

    for (col, header) in TABLE_HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(excel_error)?;
    }

    for (row_idx, record) in records.iter().enumerate() {
        let row = (row_idx + 1) as u32;

        sheet
            .write_number(row, 0, f64::from(record.id))
            .map_err(excel_error)?;
        sheet.write_string(row, 1, &record.route).map_err(excel_error)?;
        sheet.write_string(row, 2, &record.driver).map_err(excel_error)?;
        sheet.write_string(row, 3, &record.carrier).map_err(excel_error)?;

        let optional = [
            (4, &record.order),
            (5, &record.shipment),
            (6, &record.invoice),
            (7, &record.reason),
        ];
        for (col, value) in optional {
            if let Some(value) = value {
                sheet.write_string(row, col, value).map_err(excel_error)?;
            }
        }

        if let Some(date) = record.registered_on {
            sheet
                .write_datetime_with_format(row, 8, &excel_date(date)?, &date_format)
                .map_err(excel_error)?;
        }
    }

    sheet.set_column_width(0, 8).map_err(excel_error)?;
    for col in 1..=6 {
        sheet.set_column_width(col, 18).map_err(excel_error)?;
    }
    sheet.set_column_width(7, 40).map_err(excel_error)?;
    sheet.set_column_width(8, 12).map_err(excel_error)?;

    workbook.save(&exported.path).map_err(excel_error)?;

    log::info!(
        "Exported {} protocols to {}",
        records.len(),
        exported.path.display()
    );
    Ok(exported)
}
