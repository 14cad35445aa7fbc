//! CLI definition using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use protocolo_types::OutputFormat;

#[derive(Parser)]
#[command(name = "protocolo")]
#[command(version)]
#[command(about = "Register of return/redelivery delivery protocols")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Dry run: use an empty in-memory store instead of PostgreSQL
    ///
    /// The store lives only for this one command, so records made by
    /// `register` are gone before any later `show`, `list` or `delete-all`.
    #[arg(long, global = true)]
    pub memory: bool,

    /// Directory exported workbooks are written to
    #[arg(long, global = true)]
    pub export_dir: Option<PathBuf>,

    /// Template workbook used for single-protocol exports
    #[arg(long, global = true)]
    pub template: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Form fields; anything left out is prompted for
#[derive(clap::Args, Debug, Default)]
pub struct RegisterArgs {
    /// Route (rota)
    #[arg(long)]
    pub rota: Option<String>,

    /// Driver (motorista)
    #[arg(long)]
    pub motorista: Option<String>,

    /// Carrier (transportadora)
    #[arg(long)]
    pub transportadora: Option<String>,

    /// Order number(s), e.g. "501/502"
    #[arg(long)]
    pub pedido: Option<String>,

    /// Shipment number(s)
    #[arg(long)]
    pub remessa: Option<String>,

    /// Invoice number(s)
    #[arg(long)]
    pub nota_fiscal: Option<String>,

    /// Reason for the return
    #[arg(long)]
    pub motivo: Option<String>,

    /// Registration date (YYYY-MM-DD or DD/MM/YYYY). Defaults to today.
    #[arg(long)]
    pub data: Option<String>,

    /// Never prompt; missing optional fields stay empty
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new protocol
    Register(RegisterArgs),

    /// Show one protocol and export it on the template
    Show {
        /// Protocol id
        id: String,

        /// Skip the template export
        #[arg(long)]
        no_export: bool,
    },

    /// List every protocol and export them as a table
    List {
        /// Skip the table export
        #[arg(long)]
        no_export: bool,
    },

    /// Delete every protocol (requires the delete password)
    DeleteAll {
        /// Delete password; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_memory_flag_is_described_as_dry_run() {
        let command = Cli::command();
        let memory = command
            .get_arguments()
            .find(|arg| arg.get_id() == "memory")
            .unwrap();
        let help = memory.get_help().unwrap().to_string();
        let long_help = memory.get_long_help().unwrap().to_string();
        assert!(help.starts_with("Dry run"));
        assert!(long_help.contains("only for this one command"));
    }

    #[test]
    fn test_parse_register_flags() {
        let cli = Cli::try_parse_from([
            "protocolo",
            "--memory",
            "register",
            "--rota",
            "R-7",
            "--motorista",
            "Ana",
            "--transportadora",
            "TransSul",
            "--nota-fiscal",
            "10/11",
        ])
        .unwrap();

        assert!(cli.memory);
        match cli.command {
            Commands::Register(args) => {
                assert_eq!(args.rota.as_deref(), Some("R-7"));
                assert_eq!(args.nota_fiscal.as_deref(), Some("10/11"));
                assert!(args.pedido.is_none());
            }
            _ => panic!("expected register"),
        }
    }

    #[test]
    fn test_parse_show_keeps_raw_id() {
        let cli = Cli::try_parse_from(["protocolo", "show", "abc", "-f", "json"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Show { id, no_export } => {
                assert_eq!(id, "abc");
                assert!(!no_export);
            }
            _ => panic!("expected show"),
        }
    }
}
