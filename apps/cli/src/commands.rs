//! Command handlers.
//!
//! Each handler loads what it needs through [`Backend`], applies the
//! business rules from `souq-core`, and prints text or JSON.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use serde_json::json;
use souq_client::{
    Backend, CatalogRepository, ClientConfig, DateRange, ListQuery, SortOrder,
};
use souq_core::invoice::{line_payload, InvoiceForm};
use souq_core::pricing::{line_total, unit_price, LineDraft, LineItem};
use souq_core::report::{sum_by_currency, sum_by_type_and_currency};
use souq_core::validation::{parse_amount_input, parse_discount_value, parse_price, parse_quantity};
use souq_core::{
    Adjustments, CoreError, Discount, DiscountKind, Driver, InvoiceKind, InvoiceSummary, Money,
    PaymentType, Quantity, Rate,
};
use tracing::{debug, info};

use crate::cli::*;
use crate::render;

pub struct Session {
    config_path: Option<PathBuf>,
    json: bool,
}

impl Session {
    pub fn new(config_path: Option<PathBuf>, json: bool) -> Self {
        Session { config_path, json }
    }

    fn config(&self) -> Result<ClientConfig> {
        ClientConfig::load(self.config_path.clone()).context("loading configuration")
    }

    fn backend(&self) -> Result<Backend> {
        Ok(Backend::new(&self.config()?)?)
    }

    fn print_json(&self, value: &serde_json::Value) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

pub async fn run(session: &Session, command: Command) -> Result<()> {
    match command {
        Command::Price(args) => price(session, args),
        Command::Discount(args) => discount(session, args),
        Command::Totals(args) => totals(session, args),
        Command::Invoice(cmd) => invoice(session, cmd.command).await,
        Command::Drivers(cmd) => drivers(session, cmd.command).await,
        Command::Payments(cmd) => payments(session, cmd.command).await,
        Command::Lookups => lookups(session).await,
        Command::Config(cmd) => config(session, cmd.command),
    }
}

// =============================================================================
// Calculators
// =============================================================================

fn price(session: &Session, args: PriceArgs) -> Result<()> {
    let cost = parse_price(&args.cost)?.ok_or_else(|| anyhow!("--cost is required"))?;
    let factor = Rate::parse(&args.factor).ok_or_else(|| anyhow!("invalid factor: {}", args.factor))?;
    let rate = Rate::parse(&args.rate).ok_or_else(|| anyhow!("invalid rate: {}", args.rate))?;
    let quantity = parse_quantity(&args.quantity)?.unwrap_or_else(Quantity::zero);

    let price = unit_price(cost, factor, rate);
    let total = line_total(quantity, price);

    if session.json {
        return session.print_json(&json!({ "unit_price": price, "total": total }));
    }
    println!("Unit price: {}", price);
    println!("Line total: {}", total);
    Ok(())
}

fn discount(session: &Session, args: DiscountArgs) -> Result<()> {
    let kind: DiscountKind = args.kind.parse()?;
    let value = parse_discount_value(&args.value)?;
    let total = Money::parse(&args.total).ok_or_else(|| anyhow!("invalid total: {}", args.total))?;

    let discount = Discount {
        kind: Some(kind),
        value,
    };
    let result = discount.validate(total)?;

    if session.json {
        return session.print_json(&json!({ "discount_result": result, "after_discount": total - result }));
    }
    println!("Discount:       {}", result);
    println!("After discount: {}", total - result);
    Ok(())
}

fn totals(session: &Session, args: TotalsArgs) -> Result<()> {
    let summary = totals_summary(&args)?;

    if session.json {
        return session.print_json(&serde_json::to_value(summary)?);
    }
    print!("{}", render::summary(&summary));
    Ok(())
}

/// Discount results carry cents, so the discount takes a decimal amount.
fn totals_summary(args: &TotalsArgs) -> Result<InvoiceSummary> {
    let total = Money::parse(&args.total).ok_or_else(|| anyhow!("invalid total: {}", args.total))?;
    let adjustments = Adjustments {
        transport: parse_amount_input("amount_transport", &args.transport)?.unwrap_or_default(),
        labor: parse_amount_input("amount_labor", &args.labor)?.unwrap_or_default(),
        discount: parse_price(&args.discount)?.unwrap_or_default(),
        loan: parse_amount_input("loan", &args.loan)?.unwrap_or_default(),
    };
    Ok(InvoiceSummary::checked(total, adjustments, args.kind)?)
}

// =============================================================================
// Invoices
// =============================================================================

async fn invoice(session: &Session, command: InvoiceSubcommand) -> Result<()> {
    let backend = session.backend()?;
    match command {
        InvoiceSubcommand::Show { kind, id } => show_invoice(session, &backend, kind, id).await,
        InvoiceSubcommand::List(args) => list_invoices(session, &backend, args).await,
        InvoiceSubcommand::Create {
            kind,
            header,
            lines,
            dry_run,
        } => create_invoice(session, &backend, kind, header, lines, dry_run).await,
        InvoiceSubcommand::Edit {
            kind,
            id,
            header,
            add,
            remove,
        } => edit_invoice(session, &backend, kind, id, header, add, remove).await,
        InvoiceSubcommand::Delete { kind, id } => {
            backend.invoices(kind).delete(id).await?;
            println!("Deleted {} invoice {}", kind, id);
            Ok(())
        }
    }
}

async fn show_invoice(session: &Session, backend: &Backend, kind: InvoiceKind, id: i64) -> Result<()> {
    let (invoices, catalog) = (backend.invoices(kind), backend.catalog());
    let (invoice, lookups) = tokio::try_join!(invoices.show(id), catalog.load_lookups())?;
    let summary = invoice.summary(kind);

    if session.json {
        return session.print_json(&json!({
            "invoice": invoice.record,
            "lines": invoice.lines,
            "summary": summary,
        }));
    }

    let mut record = invoice.record.clone();
    if record.customer_name.is_none() {
        if let Some(customer_id) = record.customer_id.filter(|id| *id > 0) {
            match backend.customers().show(customer_id).await {
                Ok(customer) => record.customer_name = Some(customer.name),
                Err(e) => debug!(customer_id, error = %e, "Customer lookup failed"),
            }
        }
    }

    let form = invoice.to_form(kind);
    let units = lookups.unit_catalog();
    print!("{}", render::invoice_header(&record));
    if let Some(currency) = invoice.record.currency_id.and_then(|id| lookups.currency(id)) {
        println!("Currency:  {} @ {}", currency.key(), form.exchange_rate());
    }
    println!();
    print!("{}", render::lines(form.lines(), &units));
    println!("{}", render::unit_quantities(&form.lines().quantity_by_unit(&units)));
    println!();
    print!("{}", render::summary(&summary));
    Ok(())
}

async fn list_invoices(session: &Session, backend: &Backend, args: ListArgs) -> Result<()> {
    let order: SortOrder = args.sort_order.parse()?;
    let dates = match (args.from, args.to) {
        (None, None) => DateRange::today(),
        (Some(start), end) => DateRange::new(start, end.unwrap_or(start)),
        (None, Some(end)) => DateRange::new(end, end),
    };

    let mut query = ListQuery::new()
        .page(args.page, args.limit.unwrap_or(backend.page_size()))
        .sort(args.sort_by, order)
        .dates(dates);
    if let Some(search) = args.search {
        query = query.search(search);
    }
    let named = [&args.branch, &args.warehouse, &args.currency, &args.employee];
    if named.iter().any(|f| f.is_some()) {
        let lookups = backend.catalog().load_filter_lookups().await?;
        query = named_filter(query, "branch", &args.branch, |s| lookups.branch_id(s))?;
        query = named_filter(query, "warehouse", &args.warehouse, |s| lookups.warehouse_id(s))?;
        query = named_filter(query, "currency", &args.currency, |s| lookups.currency_id(s))?;
        query = named_filter(query, "employee", &args.employee, |s| lookups.employee_id(s))?;
    }
    if let Some(customer) = args.customer {
        query = query.filter("customer_id", customer);
    }
    if let Some(payment_type) = args.payment_type {
        let payment_type: PaymentType = payment_type.parse()?;
        query = query.filter("type", payment_type.label());
    }

    let (invoices, currencies) = (backend.invoices(args.kind), backend.currencies());
    let (page, currencies) = tokio::try_join!(invoices.filter(&query), currencies.all())?;
    let sums = sum_by_currency(&page.rows, &currencies);

    if session.json {
        return session.print_json(&json!({
            "invoices": page.rows,
            "total": page.total(),
            "sums": sums,
        }));
    }

    print!("{}", render::invoice_rows(&page.rows));
    println!("Showing {} of {}", page.rows.len(), page.total());
    println!("{}", render::currency_sums(&sums));
    Ok(())
}

/// Adds `{field}_id` for an id or a name given on the command line.
fn named_filter(
    query: ListQuery,
    field: &str,
    input: &Option<String>,
    resolve: impl Fn(&str) -> Option<i64>,
) -> Result<ListQuery> {
    let Some(input) = input else {
        return Ok(query);
    };
    let id = resolve(input).ok_or_else(|| anyhow!("no {} matches `{}`", field, input))?;
    Ok(query.filter(format!("{}_id", field), id))
}

/// Sell invoices may only name a sales agent from `/user/agent`.
async fn check_agent(catalog: &CatalogRepository, kind: InvoiceKind, agent: Option<i64>) -> Result<()> {
    let Some(agent_id) = agent else {
        return Ok(());
    };
    if kind != InvoiceKind::Sell {
        return Ok(());
    }
    let agents = catalog.agents().await?;
    if !agents.iter().any(|a| a.id == agent_id) {
        bail!("employee {} is not a sales agent", agent_id);
    }
    Ok(())
}

async fn create_invoice(
    session: &Session,
    backend: &Backend,
    kind: InvoiceKind,
    header: HeaderArgs,
    lines: Vec<String>,
    dry_run: bool,
) -> Result<()> {
    let line_args = lines
        .iter()
        .map(|s| parse_line_arg(s))
        .collect::<Result<Vec<_>>>()?;

    let catalog = backend.catalog();
    let lookups = catalog.load_lookups().await?;

    let today = Local::now().date_naive();
    let mut form = InvoiceForm::new(kind, header.date.unwrap_or(today));
    form.employee_id = backend.user_id();
    apply_header(&mut form, &header)?;
    check_agent(&catalog, kind, header.agent).await?;

    if form.branch_id.is_none() {
        if let Some(user_id) = backend.user_id() {
            form.branch_id = catalog.branches_for_user(user_id).await?.first().map(|b| b.id);
        }
    }
    if form.warehouse_id.is_none() {
        if let Some(branch_id) = form.branch_id {
            form.warehouse_id = catalog
                .warehouses_for_branch(branch_id)
                .await?
                .first()
                .map(|w| w.id);
        }
    }

    let currency_id = header
        .currency
        .or_else(|| lookups.currencies.first().map(|c| c.id));
    if let Some(currency_id) = currency_id {
        let rate = catalog.exchange_rate(Some(currency_id)).await;
        form.change_currency(currency_id, rate, &lookups.unit_catalog());
    }

    for arg in &line_args {
        let line = build_line(&catalog, arg, form.exchange_rate()).await?;
        form.add_line(line);
    }

    if dry_run {
        let payload = form.to_payload()?;
        let lines: Vec<_> = form
            .lines()
            .items()
            .map(|line| line_payload(kind, line, 0))
            .collect();
        return session.print_json(&json!({ "invoice": payload, "lines": lines }));
    }

    let outcome = backend.invoices(kind).save(&mut form).await?;
    info!(invoice_id = outcome.invoice_id, "Invoice created");

    if session.json {
        return session.print_json(&json!({
            "invoice_id": outcome.invoice_id,
            "lines_created": outcome.lines_created,
            "summary": form.summary(),
        }));
    }
    println!("Created {} invoice {}", kind, outcome.invoice_id);
    print!("{}", render::summary(&form.summary()));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn edit_invoice(
    session: &Session,
    backend: &Backend,
    kind: InvoiceKind,
    id: i64,
    header: HeaderArgs,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<()> {
    let line_args = add
        .iter()
        .map(|s| parse_line_arg(s))
        .collect::<Result<Vec<_>>>()?;
    let removals = remove
        .iter()
        .map(|s| parse_line_key(s))
        .collect::<Result<Vec<_>>>()?;

    let (invoices, catalog) = (backend.invoices(kind), backend.catalog());
    let (invoice, lookups) = tokio::try_join!(invoices.show(id), catalog.load_lookups())?;
    let mut form = invoice.to_form(kind);
    apply_header(&mut form, &header)?;
    check_agent(&catalog, kind, header.agent).await?;

    if let Some(currency_id) = header.currency {
        let rate = catalog.exchange_rate(Some(currency_id)).await;
        form.change_currency(currency_id, rate, &lookups.unit_catalog());
    }

    for (item_id, unit_id) in removals {
        let row_id = form
            .lines()
            .iter()
            .find(|row| row.line.item_id == item_id && row.line.unit_id == unit_id)
            .map(|row| row.row_id)
            .ok_or_else(|| anyhow!("invoice {} has no line {}:{}", id, item_id, unit_id))?;
        form.lines_mut().remove(row_id)?;
    }

    for arg in &line_args {
        let line = build_line(&catalog, arg, form.exchange_rate()).await?;
        form.add_line(line);
    }

    let outcome = invoices.save(&mut form).await?;

    if session.json {
        return session.print_json(&json!({
            "invoice_id": outcome.invoice_id,
            "lines_created": outcome.lines_created,
            "lines_updated": outcome.lines_updated,
            "lines_deleted": outcome.lines_deleted,
            "summary": form.summary(),
        }));
    }
    println!(
        "Updated {} invoice {} ({} added, {} changed, {} removed)",
        kind, id, outcome.lines_created, outcome.lines_updated, outcome.lines_deleted
    );
    print!("{}", render::summary(&form.summary()));
    Ok(())
}

/// Applies the header flags that were given; the rest stay as they are.
fn apply_header(form: &mut InvoiceForm, header: &HeaderArgs) -> Result<()> {
    if let Some(payment_type) = &header.payment_type {
        form.set_payment_type(payment_type.parse::<PaymentType>()?);
    }
    if let Some(date) = header.date {
        form.invoice_date = Some(date);
    }
    if header.due_date.is_some() {
        form.due_date = header.due_date;
    }
    if let Some(number) = &header.number {
        form.invoice_number = Some(number.clone());
    }
    if header.customer.is_some() {
        form.customer_id = header.customer;
    }
    if header.direct_name.is_some() {
        form.direct_customer_name = header.direct_name.clone();
    }
    if header.direct_phone.is_some() {
        form.direct_customer_phone = header.direct_phone.clone();
    }
    if header.branch.is_some() {
        form.branch_id = header.branch;
    }
    if header.warehouse.is_some() {
        form.warehouse_id = header.warehouse;
    }
    if header.employee.is_some() {
        form.employee_id = header.employee;
    }
    if header.agent.is_some() {
        form.agent_id = header.agent;
    }
    if header.driver.is_some() {
        form.driver_id = header.driver;
    }
    if let Some(transport) = &header.transport {
        form.transport = parse_amount_input("amount_transport", transport)?.unwrap_or_default();
    }
    if let Some(labor) = &header.labor {
        form.labor = parse_amount_input("amount_labor", labor)?.unwrap_or_default();
    }
    if let Some(loan) = &header.loan {
        form.loan = parse_amount_input("loan", loan)?.unwrap_or_default();
    }
    if header.discount_type.is_some() || header.discount_value.is_some() {
        let current = form.discount();
        let kind = match &header.discount_type {
            Some(kind) => Some(kind.parse::<DiscountKind>()?),
            None => current.kind,
        };
        let value = match &header.discount_value {
            Some(value) => parse_discount_value(value)?,
            None => current.value,
        };
        form.set_discount(kind, value);
    }
    if let Some(note) = &header.note {
        form.note = note.clone();
    }
    Ok(())
}

// =============================================================================
// Line Specs
// =============================================================================

/// A line given on the command line as `ITEM:UNIT:QTY[:PRICE]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineArg {
    pub item_id: i64,
    /// `None` picks the item's first unit.
    pub unit_id: Option<i64>,
    pub quantity: Option<Quantity>,
    /// Manual price; `None` derives it from cost, factor and rate.
    pub price: Option<Money>,
}

pub fn parse_line_arg(arg: &str) -> Result<LineArg> {
    let parts: Vec<&str> = arg.split(':').collect();
    if !(3..=4).contains(&parts.len()) {
        bail!("line `{}` must look like ITEM:UNIT:QTY[:PRICE]", arg);
    }

    let item_id = parts[0]
        .trim()
        .parse::<i64>()
        .with_context(|| format!("line `{}`: invalid item id", arg))?;
    let unit_id = match parts[1].trim() {
        "" => None,
        unit => Some(
            unit.parse::<i64>()
                .with_context(|| format!("line `{}`: invalid unit id", arg))?,
        ),
    };
    let quantity = parse_quantity(parts[2])?;
    let price = match parts.get(3) {
        Some(price) => parse_price(price)?,
        None => None,
    };

    Ok(LineArg {
        item_id,
        unit_id,
        quantity,
        price,
    })
}

/// `ITEM:UNIT` of a line to remove.
pub fn parse_line_key(key: &str) -> Result<(i64, i64)> {
    let (item, unit) = key
        .split_once(':')
        .ok_or_else(|| anyhow!("line key `{}` must look like ITEM:UNIT", key))?;
    Ok((
        item.trim().parse::<i64>().with_context(|| format!("invalid item id in `{}`", key))?,
        unit.trim().parse::<i64>().with_context(|| format!("invalid unit id in `{}`", key))?,
    ))
}

/// Builds a line the way the add-line editor does: pick the item, pick the
/// unit, type the quantity, optionally override the price.
async fn build_line(catalog: &CatalogRepository, arg: &LineArg, rate: Rate) -> Result<LineItem> {
    let item = catalog.item_with_units(arg.item_id).await?;
    debug!(item_id = arg.item_id, units = item.units.len(), "Item loaded");

    let mut draft = LineDraft::new();
    draft.select_item(item, rate);
    if let Some(unit_id) = arg.unit_id {
        if !draft.units().iter().any(|u| u.id == unit_id) {
            bail!("item {} has no unit {}", arg.item_id, unit_id);
        }
        draft.select_unit(unit_id, rate);
    }
    draft.set_quantity(arg.quantity);
    if arg.price.is_some() {
        draft.set_unit_price(arg.price);
    }

    draft
        .build()
        .map_err(|errors| anyhow!(CoreError::from(errors)))
        .with_context(|| format!("line for item {}", arg.item_id))
}

// =============================================================================
// Drivers & Payments
// =============================================================================

async fn drivers(session: &Session, command: DriversSubcommand) -> Result<()> {
    let backend = session.backend()?;
    let repo = backend.drivers();

    match command {
        DriversSubcommand::List { page, search } => {
            let mut query = ListQuery::new()
                .page(page, backend.page_size())
                .sort("id", SortOrder::Desc);
            if let Some(search) = search {
                query = query.search(search);
            }
            let rows = repo.index(&query).await?;
            if session.json {
                return session.print_json(&serde_json::to_value(&rows)?);
            }
            print!("{}", render::drivers(&rows));
        }
        DriversSubcommand::Add {
            name,
            phone,
            license_number,
            car_number,
            car_name,
            hired_date,
        } => {
            souq_core::validation::validate_required("name", &name)?;
            let driver = Driver {
                name,
                phone,
                license_number,
                car_number,
                car_name,
                hired_date,
                ..Driver::default()
            };
            let stored = repo.store(&driver).await?;
            match stored.id {
                Some(id) => println!("Added driver {} ({})", stored.name, id),
                None => println!("Added driver {}", driver.name),
            }
        }
        DriversSubcommand::Delete { id } => {
            repo.delete(id).await?;
            println!("Deleted driver {}", id);
        }
    }
    Ok(())
}

async fn payments(session: &Session, command: PaymentsSubcommand) -> Result<()> {
    let backend = session.backend()?;
    match command {
        PaymentsSubcommand::Summary { search } => {
            let mut query = ListQuery::new();
            if let Some(search) = search {
                query = query.search(search);
            }
            let (payments, currencies) = (backend.payments(), backend.currencies());
            let (payments, currencies) = tokio::try_join!(payments.index(&query), currencies.all())?;
            let sums = sum_by_type_and_currency(&payments, &currencies);

            if session.json {
                return session.print_json(&serde_json::to_value(&sums)?);
            }
            print!("{}", render::type_sums(&sums));
        }
    }
    Ok(())
}

async fn lookups(session: &Session) -> Result<()> {
    let backend = session.backend()?;
    let catalog = backend.catalog();

    // Without a configured user every branch is listed.
    let branches = match backend.user_id() {
        Some(user_id) => catalog.branches_for_user(user_id).await?,
        None => backend.branches().all().await?,
    };
    let mut out = Vec::new();
    for branch in &branches {
        let warehouses = catalog.warehouses_for_branch(branch.id).await?;
        out.push((branch, warehouses));
    }

    if session.json {
        let value: Vec<_> = out
            .iter()
            .map(|(branch, warehouses)| json!({ "branch": branch, "warehouses": warehouses }))
            .collect();
        return session.print_json(&json!(value));
    }
    for (branch, warehouses) in out {
        println!("{} {}", branch.id, branch.name);
        for warehouse in warehouses {
            println!("    {} {}", warehouse.id, warehouse.name);
        }
    }
    Ok(())
}

// =============================================================================
// Config
// =============================================================================

fn config(session: &Session, command: ConfigSubcommand) -> Result<()> {
    match command {
        ConfigSubcommand::Show => {
            let mut config = session.config()?;
            if config.api.token.is_some() {
                config.api.token = Some("********".to_string());
            }
            session.print_json(&serde_json::to_value(&config)?)
        }
        ConfigSubcommand::Init => {
            let config = session.config()?;
            let path = config.save(session.config_path.clone())?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        ConfigSubcommand::Path => {
            match session
                .config_path
                .clone()
                .or_else(ClientConfig::default_config_path)
            {
                Some(path) => println!("{}", path.display()),
                None => println!("(no config directory on this platform)"),
            }
            Ok(())
        }
    }
}
