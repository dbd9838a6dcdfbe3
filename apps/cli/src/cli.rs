//! Argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use souq_core::InvoiceKind;

#[derive(Parser, Debug)]
#[command(name = "souq", about = "Souq back office: invoices, drivers and reports")]
pub struct Cli {
    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true, env = "SOUQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Unit price and line total for a base cost.
    Price(PriceArgs),
    /// Discount amount for an invoice total.
    Discount(DiscountArgs),
    /// Grand total for an invoice total and its adjustments.
    Totals(TotalsArgs),
    Invoice(InvoiceCommand),
    Drivers(DriversCommand),
    Payments(PaymentsCommand),
    /// Branches of the configured user (every branch without one) and their warehouses.
    Lookups,
    Config(ConfigCommand),
}

// =============================================================================
// Calculators
// =============================================================================

#[derive(Args, Debug)]
pub struct PriceArgs {
    /// Item base cost.
    #[arg(long)]
    pub cost: String,
    /// Unit conversion factor.
    #[arg(long, default_value = "1")]
    pub factor: String,
    /// Currency exchange rate.
    #[arg(long, default_value = "1")]
    pub rate: String,
    #[arg(long, default_value = "1")]
    pub quantity: String,
}

#[derive(Args, Debug)]
pub struct DiscountArgs {
    /// percentage | flat
    #[arg(long)]
    pub kind: String,
    #[arg(long)]
    pub value: String,
    #[arg(long)]
    pub total: String,
}

#[derive(Args, Debug)]
pub struct TotalsArgs {
    #[arg(long, default_value = "sell", value_parser = parse_kind)]
    pub kind: InvoiceKind,
    #[arg(long)]
    pub total: String,
    #[arg(long, default_value = "")]
    pub transport: String,
    #[arg(long, default_value = "")]
    pub labor: String,
    #[arg(long, default_value = "")]
    pub discount: String,
    #[arg(long, default_value = "")]
    pub loan: String,
}

// =============================================================================
// Invoices
// =============================================================================

#[derive(Args, Debug)]
pub struct InvoiceCommand {
    #[command(subcommand)]
    pub command: InvoiceSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum InvoiceSubcommand {
    /// Header, lines and totals of one invoice.
    Show {
        #[arg(value_parser = parse_kind)]
        kind: InvoiceKind,
        id: i64,
    },
    /// Paginated invoice list with per-currency sums.
    List(ListArgs),
    /// Create an invoice.
    Create {
        #[arg(value_parser = parse_kind)]
        kind: InvoiceKind,
        #[command(flatten)]
        header: HeaderArgs,
        /// ITEM:UNIT:QTY[:PRICE]; leave UNIT empty for the item's first unit.
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
        /// Print the request body instead of sending it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Change an invoice's header or lines.
    Edit {
        #[arg(value_parser = parse_kind)]
        kind: InvoiceKind,
        id: i64,
        #[command(flatten)]
        header: HeaderArgs,
        /// ITEM:UNIT:QTY[:PRICE] to add.
        #[arg(long = "add-line")]
        add: Vec<String>,
        /// ITEM:UNIT of a line to remove.
        #[arg(long = "remove-line")]
        remove: Vec<String>,
    },
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: InvoiceKind,
        id: i64,
    },
}

/// Header fields; anything left out keeps its current or default value.
#[derive(Args, Debug, Default)]
pub struct HeaderArgs {
    /// cash | loan | direct
    #[arg(long = "type")]
    pub payment_type: Option<String>,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Loan invoices only.
    #[arg(long)]
    pub due_date: Option<NaiveDate>,
    #[arg(long)]
    pub number: Option<String>,
    #[arg(long)]
    pub customer: Option<i64>,
    #[arg(long)]
    pub direct_name: Option<String>,
    #[arg(long)]
    pub direct_phone: Option<String>,
    #[arg(long)]
    pub branch: Option<i64>,
    #[arg(long)]
    pub warehouse: Option<i64>,
    #[arg(long)]
    pub employee: Option<i64>,
    #[arg(long)]
    pub currency: Option<i64>,
    #[arg(long)]
    pub agent: Option<i64>,
    #[arg(long)]
    pub driver: Option<i64>,
    #[arg(long)]
    pub transport: Option<String>,
    #[arg(long)]
    pub labor: Option<String>,
    #[arg(long)]
    pub loan: Option<String>,
    /// percentage | flat
    #[arg(long)]
    pub discount_type: Option<String>,
    #[arg(long)]
    pub discount_value: Option<String>,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(value_parser = parse_kind)]
    pub kind: InvoiceKind,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Rows per page (defaults to the configured page size).
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long, default_value = "invoice_date")]
    pub sort_by: String,
    #[arg(long, default_value = "desc")]
    pub sort_order: String,
    #[arg(long)]
    pub search: Option<String>,
    /// Start date (defaults to today).
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// End date (defaults to the start date).
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Branch id or name.
    #[arg(long)]
    pub branch: Option<String>,
    /// Warehouse id or name.
    #[arg(long)]
    pub warehouse: Option<String>,
    /// Currency id, name or symbol.
    #[arg(long)]
    pub currency: Option<String>,
    /// Employee id or name.
    #[arg(long)]
    pub employee: Option<String>,
    #[arg(long)]
    pub customer: Option<i64>,
    #[arg(long = "type")]
    pub payment_type: Option<String>,
}

// =============================================================================
// Drivers, Payments, Config
// =============================================================================

#[derive(Args, Debug)]
pub struct DriversCommand {
    #[command(subcommand)]
    pub command: DriversSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum DriversSubcommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        license_number: Option<String>,
        #[arg(long)]
        car_number: Option<String>,
        #[arg(long)]
        car_name: Option<String>,
        #[arg(long)]
        hired_date: Option<NaiveDate>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
pub struct PaymentsCommand {
    #[command(subcommand)]
    pub command: PaymentsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum PaymentsSubcommand {
    /// Payment totals per type and currency.
    Summary {
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Effective configuration (file + environment).
    Show,
    /// Write a config file with the effective values.
    Init,
    /// Where the config file is read from.
    Path,
}

fn parse_kind(value: &str) -> Result<InvoiceKind, String> {
    value.parse().map_err(|e: souq_core::ValidationError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_invoice_create() {
        let cli = Cli::parse_from([
            "souq", "invoice", "create", "buy-return", "--type", "cash", "--customer", "3",
            "--line", "7:1:2", "--line", "8::1:12.5",
        ]);
        match cli.command {
            Command::Invoice(InvoiceCommand {
                command: InvoiceSubcommand::Create { kind, header, lines, dry_run },
            }) => {
                assert_eq!(kind, InvoiceKind::BuyReturn);
                assert_eq!(header.customer, Some(3));
                assert_eq!(lines, vec!["7:1:2", "8::1:12.5"]);
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["souq", "invoice", "show", "refund", "1"]).is_err());
    }
}
