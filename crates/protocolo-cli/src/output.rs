//! Output formatting module

use serde_json::{json, Value};

use protocolo_app::app::Response;
use protocolo_app::config::Config;
use protocolo_app::export::ExportedFile;
use protocolo_domain::model::ProtocolRecord;
use protocolo_domain::service::AccessDenied;
use protocolo_types::{OutputFormat, Result};

const MSG_MISSING_ID: &str = "Digite um ID para consultar.";
const MSG_INVALID_ID: &str = "Por favor, insira um ID válido.";

fn denied_message(denied: &AccessDenied) -> &'static str {
    match denied {
        AccessDenied::WrongSecret => "Senha incorreta. Nenhum registro foi excluído.",
        AccessDenied::NotConfigured => {
            "Exclusão desabilitada: DELETE_PASSWORD não está configurada."
        }
    }
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("-")
}

fn date_str(record: &ProtocolRecord) -> String {
    record
        .registered_on
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let cut: String = value.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        value.to_string()
    }
}

/// JSON shape of a response
pub fn response_json(response: &Response) -> Result<Value> {
    let value = match response {
        Response::Registered { id } => json!({ "status": "registered", "id": id }),
        Response::Found { record, export } => json!({
            "status": "found",
            "record": serde_json::to_value(record)?,
            "export": serde_json::to_value(export)?,
        }),
        Response::NotFound { id } => json!({ "status": "not_found", "id": id }),
        Response::MissingId => json!({ "status": "missing_id", "message": MSG_MISSING_ID }),
        Response::InvalidId { input } => json!({
            "status": "invalid_id",
            "input": input,
            "message": MSG_INVALID_ID,
        }),
        Response::Listed { records, export } => json!({
            "status": "listed",
            "count": records.len(),
            "records": serde_json::to_value(records)?,
            "export": serde_json::to_value(export)?,
        }),
        Response::Deleted { count } => json!({ "status": "deleted", "count": count }),
        Response::DeleteDenied(denied) => json!({
            "status": "denied",
            "reason": denied.to_string(),
            "message": denied_message(denied),
        }),
    };
    Ok(value)
}

fn print_export(export: &Option<ExportedFile>) {
    if let Some(file) = export {
        println!();
        println!("Download:        {}", file.path.display());
        println!("Arquivo:         {} ({})", file.file_name, file.mime);
    }
}

fn print_record(record: &ProtocolRecord) {
    println!("\nProtocolo #{}", record.id);
    println!("===============");
    println!("Rota:            {}", record.route);
    println!("Motorista:       {}", record.driver);
    println!("Transportadora:  {}", record.carrier);
    println!("Pedido:          {}", or_dash(&record.order));
    println!("Remessa:         {}", or_dash(&record.shipment));
    println!("Nota Fiscal:     {}", or_dash(&record.invoice));
    println!("Motivo:          {}", or_dash(&record.reason));
    println!("Data:            {}", date_str(record));
}

fn print_table(records: &[ProtocolRecord]) {
    println!("Protocolos");
    println!("==========");
    println!("Total: {}", records.len());
    println!();

    if records.is_empty() {
        println!("Nenhum registro encontrado.");
        return;
    }

    println!(
        "{:>6} {:<12} {:<18} {:<18} {:<14} {:<14} {:<14} {:>10}",
        "ID", "Rota", "Motorista", "Transportadora", "Pedido", "Remessa", "Nota Fiscal", "Data"
    );
    println!("{}", "-".repeat(112));

    for record in records {
        println!(
            "{:>6} {:<12} {:<18} {:<18} {:<14} {:<14} {:<14} {:>10}",
            record.id,
            truncate(&record.route, 12),
            truncate(&record.driver, 18),
            truncate(&record.carrier, 18),
            truncate(or_dash(&record.order), 14),
            truncate(or_dash(&record.shipment), 14),
            truncate(or_dash(&record.invoice), 14),
            date_str(record),
        );
    }
}

pub fn output_response(output_format: OutputFormat, response: &Response) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(&response_json(response)?)?;
        println!("{}", content);
        return Ok(());
    }

    match response {
        Response::Registered { id } => {
            println!("Protocolo registrado com sucesso! ID: {}", id);
        }
        Response::Found { record, export } => {
            print_record(record);
            print_export(export);
        }
        Response::NotFound { id } => {
            println!("Nenhum registro encontrado para o ID {}.", id);
        }
        Response::MissingId => println!("{}", MSG_MISSING_ID),
        Response::InvalidId { .. } => println!("{}", MSG_INVALID_ID),
        Response::Listed { records, export } => {
            print_table(records);
            print_export(export);
        }
        Response::Deleted { count } => {
            println!("{} registro(s) excluído(s).", count);
        }
        Response::DeleteDenied(denied) => println!("{}", denied_message(denied)),
    }

    Ok(())
}

pub fn output_config(output_format: OutputFormat, config: &Config) -> Result<()> {
    if output_format == OutputFormat::Json {
        let masked = |set: bool| if set { "********" } else { "(not set)" };
        let value = json!({
            "db_host": config.db_host,
            "db_port": config.db_port,
            "db_name": config.db_name,
            "db_user": config.db_user,
            "db_password": masked(config.db_password.is_some()),
            "db_max_connections": config.db_max_connections,
            "delete_password": masked(config.delete_secret.is_some()),
            "template": config.template_path,
            "export_dir": config.export_dir,
            "output_format": config.output_format,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", config);
    }
    Ok(())
}
