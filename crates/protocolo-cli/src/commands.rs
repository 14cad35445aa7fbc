//! Command handlers

use chrono::{Local, NaiveDate};
use dialoguer::{Input, Password};

use crate::cli::{Cli, Commands, RegisterArgs};
use crate::output::{output_config, output_response};
use protocolo_app::app::{Action, ExportSettings, ProtocolService};
use protocolo_app::config::Config;
use protocolo_app::repository::open_protocol_repo;
use protocolo_domain::model::NewProtocol;
use protocolo_types::{ConfigError, Error, Result};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Execute the CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref dir) = cli.export_dir {
        config.export_dir = dir.clone();
    }
    if let Some(ref template) = cli.template {
        config.template_path = template.clone();
    }
    let output_format = cli.format.unwrap_or(config.output_format);
    log::debug!("Effective configuration: {:?}", config);

    // Input is collected before the store is opened
    let Some(action) = build_action(cli.command)? else {
        return output_config(output_format, &config);
    };

    if cli.memory && !matches!(action, Action::Register(_)) {
        log::warn!("--memory starts empty on every run; earlier registrations are not visible");
    }

    let repo = open_protocol_repo(&config, cli.memory).await?;
    let service = ProtocolService::new(
        repo,
        Box::new(config.purge_gate()),
        ExportSettings {
            template_path: config.template_path.clone(),
            export_dir: config.export_dir.clone(),
        },
    );

    let result = service.dispatch(action).await;
    service.shutdown().await;

    output_response(output_format, &result?)
}

/// `None` for commands that never touch the store
fn build_action(command: Commands) -> Result<Option<Action>> {
    let action = match command {
        Commands::Register(args) => Action::Register(collect_form(args)?),
        Commands::Show { id, no_export } => Action::Lookup {
            raw_id: id,
            export: !no_export,
        },
        Commands::List { no_export } => Action::ListAll { export: !no_export },
        Commands::DeleteAll { password } => {
            let secret = match password {
                Some(p) => p,
                None => Password::new()
                    .with_prompt("Senha para excluir todos os registros")
                    .allow_empty_password(true)
                    .interact()
                    .map_err(prompt_error)?,
            };
            Action::DeleteAll { secret }
        }
        Commands::Config => return Ok(None),
    };
    Ok(Some(action))
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::Io(std::io::Error::other(e.to_string()))
}

fn prompt_text(label: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)
}

/// Flag value if given, otherwise ask (unless prompting is off)
fn field(value: Option<String>, label: &str, interactive: bool) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None if interactive => prompt_text(label),
        None => Ok(String::new()),
    }
}

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
}

fn collect_form(args: RegisterArgs) -> Result<NewProtocol> {
    let interactive = !args.no_input;

    let route = field(args.rota, "Rota", interactive)?;
    let driver = field(args.motorista, "Motorista", interactive)?;
    let carrier = field(args.transportadora, "Transportadora", interactive)?;
    let order = field(args.pedido, "Pedido", interactive)?;
    let shipment = field(args.remessa, "Remessa", interactive)?;
    let invoice = field(args.nota_fiscal, "Nota Fiscal", interactive)?;
    let reason = field(args.motivo, "Motivo", interactive)?;

    let today = Local::now().date_naive();
    let registered_on = match args.data {
        Some(raw) => parse_date(&raw).ok_or(ConfigError::Invalid {
            var: "--data",
            value: raw,
        })?,
        None if interactive => {
            let raw: String = Input::new()
                .with_prompt("Data")
                .default(today.format("%d/%m/%Y").to_string())
                .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
                    parse_date(input)
                        .map(|_| ())
                        .ok_or("use DD/MM/AAAA ou AAAA-MM-DD")
                })
                .interact_text()
                .map_err(prompt_error)?;
            parse_date(&raw).unwrap_or(today)
        }
        None => today,
    };

    Ok(NewProtocol {
        route: route.trim().to_string(),
        driver: driver.trim().to_string(),
        carrier: carrier.trim().to_string(),
        order: optional(order),
        shipment: optional(shipment),
        invoice: optional(invoice),
        reason: optional(reason),
        registered_on: Some(registered_on),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 20);
        assert_eq!(parse_date("2024-05-20"), expected);
        assert_eq!(parse_date("20/05/2024"), expected);
        assert_eq!(parse_date(" 20-05-2024 "), expected);
        assert_eq!(parse_date("20.05.2024"), None);
        assert_eq!(parse_date("31/02/2024"), None);
    }

    #[test]
    fn test_collect_form_without_prompts() {
        let args = RegisterArgs {
            rota: Some(" R-3 ".to_string()),
            motorista: Some("Ana".to_string()),
            transportadora: Some("TransSul".to_string()),
            pedido: Some("1/2".to_string()),
            motivo: Some("   ".to_string()),
            data: Some("01/02/2024".to_string()),
            no_input: true,
            ..Default::default()
        };

        let form = collect_form(args).unwrap();
        assert_eq!(form.route, "R-3");
        assert_eq!(form.order.as_deref(), Some("1/2"));
        assert_eq!(form.shipment, None);
        assert_eq!(form.reason, None);
        assert_eq!(form.registered_on, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn test_collect_form_rejects_bad_date() {
        let args = RegisterArgs {
            data: Some("ontem".to_string()),
            no_input: true,
            ..Default::default()
        };
        let err = collect_form(args).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::Invalid { var: "--data", .. })
        ));
    }

    #[test]
    fn test_build_action_maps_flags() {
        let action = build_action(Commands::Show {
            id: "12".to_string(),
            no_export: true,
        })
        .unwrap();
        assert_eq!(
            action,
            Some(Action::Lookup {
                raw_id: "12".to_string(),
                export: false
            })
        );

        let action = build_action(Commands::DeleteAll {
            password: Some("x".to_string()),
        })
        .unwrap();
        assert_eq!(
            action,
            Some(Action::DeleteAll {
                secret: "x".to_string()
            })
        );
        assert_eq!(build_action(Commands::Config).unwrap(), None);
    }
}
