use crate::adapters::rpc::{date_value, decimal_value};
use crate::adapters::session::Session;
use crate::config::DemoSettings;
use crate::domain::model::ChartSelection;
use crate::domain::ports::DemoLoader;
use crate::utils::error::{Result, TaskError};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

const BANK_ES_WIZARD: &str = "load.banks";
const COUNTRY_ZIP_ES_WIZARD: &str = "load.country.zips";

/// (name, street, zip, city, country code)
const PARTIES: &[(&str, &str, &str, &str, &str)] = &[
    ("Mediterrània Distribucions SL", "Carrer Major 12", "08720", "Vilafranca del Penedès", "ES"),
    ("Ferreteria Costa", "Avinguda Catalunya 45", "17300", "Blanes", "ES"),
    ("Hierros del Norte SA", "Calle Mayor 3", "48001", "Bilbao", "ES"),
    ("Oficinas Levante SL", "Plaza del Ayuntamiento 8", "46002", "València", "ES"),
    ("Atlantic Office Supplies Ltd", "12 Harbour Street", "BS1 4QA", "Bristol", "GB"),
    ("Lisboa Comércio Lda", "Rua Augusta 100", "1100-053", "Lisboa", "PT"),
    ("Provence Matériaux SARL", "12 Rue de la République", "13001", "Marseille", "FR"),
    ("Nordlicht Handels GmbH", "Hauptstraße 7", "20095", "Hamburg", "DE"),
];

const CATEGORIES: &[&str] = &["Hardware", "Software", "Services", "Office Supplies"];

/// (name, category, type, list price, cost price)
const PRODUCTS: &[(&str, &str, &str, &str, &str)] = &[
    ("Laptop 14\"", "Hardware", "goods", "899.00", "640.00"),
    ("Monitor 24\"", "Hardware", "goods", "179.00", "120.00"),
    ("Wireless Keyboard", "Hardware", "goods", "39.90", "21.50"),
    ("Office Suite Licence", "Software", "service", "120.00", "80.00"),
    ("Antivirus 1 Year", "Software", "service", "45.00", "25.00"),
    ("On-site Installation", "Services", "service", "60.00", "35.00"),
    ("A4 Paper Box", "Office Supplies", "goods", "24.50", "15.00"),
    ("Toner Cartridge", "Office Supplies", "goods", "69.00", "42.00"),
];

const OPPORTUNITIES: &[&str] = &[
    "Office renewal",
    "Yearly software licences",
    "Printer fleet maintenance",
    "New branch equipment",
];

/// (name, rate)
const TAXES: &[(&str, &str)] = &[("VAT 21%", "0.21"), ("VAT 10%", "0.10"), ("VAT 4%", "0.04")];

const SALE_COUNT: usize = 5;
const PURCHASE_COUNT: usize = 3;

#[derive(Debug, Deserialize)]
struct PartyRow {
    id: i64,
    #[serde(default)]
    addresses: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProductRow {
    id: i64,
    rec_name: String,
    default_uom: i64,
    #[serde(default)]
    list_price: Value,
    #[serde(default)]
    cost_price: Value,
    #[serde(default, rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct NamedRow {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CountryRow {
    id: i64,
    code: String,
}

#[derive(Debug, Deserialize)]
struct WarehouseRow {
    id: i64,
    storage_location: Option<i64>,
    production_location: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BomOutputRow {
    bom: i64,
    product: i64,
    uom: i64,
}

#[derive(Debug, Clone, Copy)]
enum PriceField {
    List,
    Cost,
}

/// Two lines per order, rotating through `products`; quantity grows with the order.
fn order_lines(products: &[ProductRow], order: usize, price: PriceField) -> Vec<Value> {
    if products.is_empty() {
        return Vec::new();
    }
    (0..2)
        .map(|offset| {
            let product = &products[(order * 2 + offset) % products.len()];
            let unit_price = match price {
                PriceField::List => product.list_price.clone(),
                PriceField::Cost => product.cost_price.clone(),
            };
            json!({
                "type": "line",
                "sequence": offset + 1,
                "product": product.id,
                "description": product.rec_name,
                "quantity": (order + 1) as f64,
                "unit": product.default_uom,
                "unit_price": unit_price,
            })
        })
        .collect()
}

/// 透過 session 建立示範資料
pub struct RpcDemoLoader<'a> {
    session: &'a Session,
    settings: DemoSettings,
    today: NaiveDate,
    installed: Vec<String>,
}

impl<'a> RpcDemoLoader<'a> {
    pub fn new(session: &'a Session, settings: DemoSettings, today: NaiveDate) -> Self {
        Self {
            session,
            settings,
            today,
            installed: Vec::new(),
        }
    }

    /// Modules installed on the server; decides optional fields such as `salable`.
    pub fn with_installed(mut self, installed: &[String]) -> Self {
        self.installed = installed.to_vec();
        self
    }

    fn has(&self, module: &str) -> bool {
        self.installed.iter().any(|m| m == module)
    }

    async fn first_id(&self, model: &str, domain: Value) -> Result<i64> {
        self.session
            .search(model, domain.clone(), Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TaskError::missing_record(model, domain.to_string()))
    }

    async fn company_id(&self) -> Result<i64> {
        if let Some(id) = self.session.context_value("company")?.and_then(|v| v.as_i64()) {
            return Ok(id);
        }
        self.first_id("company.company", json!([])).await
    }

    async fn currency_id(&self) -> Result<i64> {
        self.first_id(
            "currency.currency",
            json!([["code", "=", self.settings.currency]]),
        )
        .await
    }

    async fn payment_term_id(&self) -> Result<Option<i64>> {
        Ok(self
            .session
            .search("account.invoice.payment_term", json!([]), Some(1))
            .await?
            .into_iter()
            .next())
    }

    async fn parties_with_address(&self) -> Result<Vec<PartyRow>> {
        let parties: Vec<PartyRow> = self
            .session
            .search_read("party.party", json!([]), None, &["id", "addresses"])
            .await?;
        let parties: Vec<PartyRow> = parties
            .into_iter()
            .filter(|p| !p.addresses.is_empty())
            .collect();
        if parties.is_empty() {
            return Err(TaskError::missing_record("party.party", "with address"));
        }
        Ok(parties)
    }

    async fn products(&self, domain: Value) -> Result<Vec<ProductRow>> {
        let products: Vec<ProductRow> = self
            .session
            .search_read(
                "product.product",
                domain.clone(),
                None,
                &["id", "rec_name", "default_uom", "list_price", "cost_price", "type"],
            )
            .await?;
        if products.is_empty() {
            return Err(TaskError::missing_record("product.product", domain.to_string()));
        }
        Ok(products)
    }

    async fn warehouse(&self) -> Result<WarehouseRow> {
        let rows: Vec<WarehouseRow> = self
            .session
            .search_read(
                "stock.location",
                json!([["type", "=", "warehouse"]]),
                Some(1),
                &["id", "storage_location", "production_location"],
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| TaskError::missing_record("stock.location", "type = warehouse"))
    }

    async fn run_module_loader(&self, wizard: &str) -> Result<()> {
        self.session.run_wizard(wizard, &[("accept", json!({}))]).await
    }

    /// Draft orders for `model`, one per rotating party.
    async fn create_orders(
        &self,
        model: &str,
        date_field: &str,
        count: usize,
        products: &[ProductRow],
        price: PriceField,
    ) -> Result<Vec<i64>> {
        let parties = self.parties_with_address().await?;
        let company = self.company_id().await?;
        let currency = self.currency_id().await?;
        let payment_term = self.payment_term_id().await?;

        let records: Vec<Value> = (0..count)
            .map(|i| {
                let party = &parties[i % parties.len()];
                let date = self
                    .today
                    .checked_sub_days(Days::new(i as u64))
                    .unwrap_or(self.today);
                let mut record = json!({
                    "party": party.id,
                    "invoice_address": party.addresses[0],
                    "company": company,
                    "currency": currency,
                    "lines": [["create", order_lines(products, i, price)]],
                });
                record[date_field] = date_value(date);
                if model == "sale.sale" {
                    record["shipment_address"] = json!(party.addresses[0]);
                }
                if let Some(term) = payment_term {
                    record["payment_term"] = json!(term);
                }
                record
            })
            .collect();

        self.session.create(model, records).await
    }

    async fn process_orders(&self, model: &str) -> Result<()> {
        let drafts = self
            .session
            .search(model, json!([["state", "=", "draft"]]), None)
            .await?;
        for button in ["quote", "confirm", "process"] {
            self.session.button(model, button, &drafts).await?;
        }
        tracing::info!("🔁 Processed {} {} records", drafts.len(), model);
        Ok(())
    }
}

#[async_trait]
impl<'a> DemoLoader for RpcDemoLoader<'a> {
    async fn load_banks(&self) -> Result<()> {
        self.run_module_loader(BANK_ES_WIZARD).await
    }

    async fn load_subdivisions(&self) -> Result<()> {
        self.run_module_loader(COUNTRY_ZIP_ES_WIZARD).await
    }

    async fn create_company(&self, name: &str) -> Result<()> {
        let currency = self.currency_id().await?;
        let party = self.session.create_one("party.party", json!({"name": name})).await?;
        let company = self
            .session
            .create_one("company.company", json!({"party": party, "currency": currency}))
            .await?;

        self.session
            .write(
                "res.user",
                &[self.session.user_id()],
                json!({"main_company": company, "company": company}),
            )
            .await?;
        self.session.refresh_context().await?;
        tracing::info!("🏢 Company '{}' created (id {})", name, company);
        Ok(())
    }

    async fn create_fiscal_year(&self, year: i32) -> Result<()> {
        let company = self.company_id().await?;
        let (start, end) = match (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(TaskError::FixtureError {
                    step: "fiscal_year".to_string(),
                    details: format!("invalid year {}", year),
                })
            }
        };

        let sequence = self
            .session
            .create_one(
                "ir.sequence.strict",
                json!({"name": year.to_string(), "code": "account.move", "company": company}),
            )
            .await?;
        let fiscal_year = self
            .session
            .create_one(
                "account.fiscalyear",
                json!({
                    "name": year.to_string(),
                    "start_date": date_value(start),
                    "end_date": date_value(end),
                    "post_move_sequence": sequence,
                    "company": company,
                }),
            )
            .await?;
        self.session
            .button("account.fiscalyear", "create_period", &[fiscal_year])
            .await?;
        tracing::info!("📅 Fiscal year {} created", year);
        Ok(())
    }

    async fn create_payment_terms(&self) -> Result<()> {
        self.session
            .create(
                "account.invoice.payment_term",
                vec![json!({"name": "Cash", "lines": [["create", [{"type": "remainder"}]]]})],
            )
            .await?;
        Ok(())
    }

    async fn create_account_chart(&self, chart: &ChartSelection) -> Result<()> {
        let company = self.company_id().await?;
        let template = self.session.model_data_id(&chart.module, &chart.fs_id).await?;

        let wizard = self.session.start_wizard("account.create_chart").await?;
        wizard
            .execute(
                "create_account",
                json!({"account": {"account_template": template, "company": company}}),
            )
            .await?;

        let receivable = self
            .first_id(
                "account.account",
                json!([["kind", "=", "receivable"], ["company", "=", company]]),
            )
            .await?;
        let payable = self
            .first_id(
                "account.account",
                json!([["kind", "=", "payable"], ["company", "=", company]]),
            )
            .await?;
        wizard
            .execute(
                "create_properties",
                json!({"properties": {
                    "company": company,
                    "account_receivable": receivable,
                    "account_payable": payable,
                }}),
            )
            .await?;
        wizard.finish().await?;

        tracing::info!("📒 Chart of accounts {}.{} created", chart.module, chart.fs_id);
        Ok(())
    }

    async fn create_taxes(&self) -> Result<()> {
        let company = self.company_id().await?;
        let account = self
            .first_id(
                "account.account",
                json!([["kind", "=", "other"], ["company", "=", company]]),
            )
            .await?;

        let taxes = TAXES
            .iter()
            .map(|(name, rate)| {
                json!({
                    "name": name,
                    "description": name,
                    "type": "percentage",
                    "rate": decimal_value(rate),
                    "invoice_account": account,
                    "credit_note_account": account,
                    "company": company,
                })
            })
            .collect();
        self.session.create("account.tax", taxes).await?;
        Ok(())
    }

    async fn create_payment_types(&self) -> Result<()> {
        let types = [
            ("Cash", "receivable"),
            ("Bank Transfer", "receivable"),
            ("Bank Transfer", "payable"),
        ]
        .iter()
        .map(|(name, kind)| json!({"name": name, "kind": kind}))
        .collect();
        self.session.create("account.payment.type", types).await?;
        Ok(())
    }

    async fn create_parties(&self) -> Result<()> {
        let codes: Vec<&str> = PARTIES.iter().map(|p| p.4).collect();
        let countries: Vec<CountryRow> = self
            .session
            .search_read(
                "country.country",
                json!([["code", "in", codes]]),
                None,
                &["id", "code"],
            )
            .await?;
        let countries: HashMap<String, i64> =
            countries.into_iter().map(|c| (c.code, c.id)).collect();

        let parties = PARTIES
            .iter()
            .map(|(name, street, zip, city, country)| {
                json!({
                    "name": name,
                    "addresses": [["create", [{
                        "street": street,
                        "zip": zip,
                        "city": city,
                        "country": countries.get(*country),
                    }]]],
                })
            })
            .collect();
        let ids = self.session.create("party.party", parties).await?;
        tracing::info!("👥 {} parties created", ids.len());
        Ok(())
    }

    async fn create_product_categories(&self) -> Result<()> {
        let categories = CATEGORIES.iter().map(|name| json!({"name": name})).collect();
        self.session.create("product.category", categories).await?;
        Ok(())
    }

    async fn create_products(&self) -> Result<()> {
        let uom = self
            .first_id("product.uom", json!([["symbol", "=", "u"]]))
            .await?;
        let categories: Vec<NamedRow> = self
            .session
            .search_read("product.category", json!([]), None, &["id", "name"])
            .await?;
        let categories: HashMap<String, i64> =
            categories.into_iter().map(|c| (c.name, c.id)).collect();

        let templates = PRODUCTS
            .iter()
            .map(|(name, category, kind, list_price, cost_price)| {
                let mut template = json!({
                    "name": name,
                    "type": kind,
                    "list_price": decimal_value(list_price),
                    "cost_price": decimal_value(cost_price),
                    "default_uom": uom,
                    "category": categories.get(*category),
                    "products": [["create", [{}]]],
                });
                if self.has("sale") {
                    template["salable"] = json!(true);
                    template["sale_uom"] = json!(uom);
                }
                if self.has("purchase") {
                    template["purchasable"] = json!(true);
                    template["purchase_uom"] = json!(uom);
                }
                template
            })
            .collect();
        let ids = self.session.create("product.template", templates).await?;
        tracing::info!("📦 {} products created", ids.len());
        Ok(())
    }

    async fn create_price_lists(&self) -> Result<()> {
        let company = self.company_id().await?;
        self.session
            .create(
                "product.price_list",
                vec![json!({
                    "name": "Wholesale",
                    "company": company,
                    "lines": [["create", [{"formula": "unit_price * 0.9"}]]],
                })],
            )
            .await?;
        Ok(())
    }

    async fn create_sales(&self) -> Result<()> {
        let products = self.products(json!([["salable", "=", true]])).await?;
        let ids = self
            .create_orders("sale.sale", "sale_date", SALE_COUNT, &products, PriceField::List)
            .await?;
        tracing::info!("🧾 {} sales created", ids.len());
        Ok(())
    }

    async fn process_sales(&self) -> Result<()> {
        self.process_orders("sale.sale").await
    }

    async fn create_opportunities(&self) -> Result<()> {
        let parties = self.parties_with_address().await?;
        let company = self.company_id().await?;

        let records = OPPORTUNITIES
            .iter()
            .enumerate()
            .map(|(i, description)| {
                json!({
                    "description": description,
                    "party": parties[i % parties.len()].id,
                    "start_date": date_value(self.today),
                    "probability": 25 * (i as i64 + 1),
                    "company": company,
                })
            })
            .collect();
        self.session.create("sale.opportunity", records).await?;
        Ok(())
    }

    async fn process_opportunities(&self) -> Result<()> {
        let leads = self
            .session
            .search("sale.opportunity", json!([["state", "=", "lead"]]), None)
            .await?;
        self.session
            .button("sale.opportunity", "opportunity", &leads)
            .await?;
        if let Some(last) = leads.last() {
            self.session.button("sale.opportunity", "lost", &[*last]).await?;
        }
        Ok(())
    }

    async fn create_purchases(&self) -> Result<()> {
        let products = self.products(json!([["purchasable", "=", true]])).await?;
        let ids = self
            .create_orders(
                "purchase.purchase",
                "purchase_date",
                PURCHASE_COUNT,
                &products,
                PriceField::Cost,
            )
            .await?;
        tracing::info!("🛒 {} purchases created", ids.len());
        Ok(())
    }

    async fn process_purchases(&self) -> Result<()> {
        self.process_orders("purchase.purchase").await
    }

    async fn create_boms(&self) -> Result<()> {
        let goods = self.products(json!([["type", "=", "goods"]])).await?;
        if goods.len() < 3 {
            return Err(TaskError::missing_record("product.product", "three goods products"));
        }
        let (output, inputs) = (&goods[0], &goods[1..3]);

        let input_lines: Vec<Value> = inputs
            .iter()
            .map(|p| json!({"product": p.id, "quantity": 1.0, "uom": p.default_uom}))
            .collect();
        let bom = self
            .session
            .create_one(
                "production.bom",
                json!({
                    "name": format!("BOM {}", output.rec_name),
                    "inputs": [["create", input_lines]],
                    "outputs": [["create", [{
                        "product": output.id,
                        "quantity": 1.0,
                        "uom": output.default_uom,
                    }]]],
                }),
            )
            .await?;
        self.session
            .write(
                "product.product",
                &[output.id],
                json!({"boms": [["create", [{"bom": bom}]]]}),
            )
            .await
    }

    async fn create_production_requests(&self) -> Result<()> {
        let company = self.company_id().await?;
        let warehouse = self.warehouse().await?;
        let outputs: Vec<BomOutputRow> = self
            .session
            .search_read("production.bom.output", json!([]), None, &["bom", "product", "uom"])
            .await?;

        let productions = outputs
            .iter()
            .map(|output| {
                json!({
                    "product": output.product,
                    "bom": output.bom,
                    "quantity": 5.0,
                    "uom": output.uom,
                    "planned_date": date_value(self.today),
                    "warehouse": warehouse.id,
                    "location": warehouse.production_location,
                    "company": company,
                })
            })
            .collect();
        self.session.create("production", productions).await?;
        Ok(())
    }

    async fn create_inventory(&self) -> Result<()> {
        let company = self.company_id().await?;
        let warehouse = self.warehouse().await?;
        let storage = warehouse
            .storage_location
            .ok_or_else(|| TaskError::missing_record("stock.location", "warehouse storage location"))?;
        let goods = self.products(json!([["type", "=", "goods"]])).await?;

        let lines: Vec<Value> = goods
            .iter()
            .filter(|p| p.kind == "goods")
            .map(|p| json!({"product": p.id, "quantity": 100.0}))
            .collect();
        let inventory = self
            .session
            .create_one(
                "stock.inventory",
                json!({
                    "location": storage,
                    "date": date_value(self.today),
                    "company": company,
                    "lines": [["create", lines]],
                }),
            )
            .await?;
        self.session
            .button("stock.inventory", "confirm", &[inventory])
            .await
    }

    async fn process_customer_shipments(&self) -> Result<()> {
        let waiting = self
            .session
            .search("stock.shipment.out", json!([["state", "=", "waiting"]]), None)
            .await?;
        for button in ["assign_try", "pack", "done"] {
            self.session
                .button("stock.shipment.out", button, &waiting)
                .await?;
        }
        tracing::info!("🚚 {} customer shipments processed", waiting.len());
        Ok(())
    }

    async fn process_supplier_shipments(&self) -> Result<()> {
        let drafts = self
            .session
            .search("stock.shipment.in", json!([["state", "=", "draft"]]), None)
            .await?;
        for button in ["receive", "done"] {
            self.session
                .button("stock.shipment.in", button, &drafts)
                .await?;
        }
        tracing::info!("🚚 {} supplier shipments processed", drafts.len());
        Ok(())
    }

    async fn process_customer_invoices(&self) -> Result<()> {
        let drafts = self
            .session
            .search(
                "account.invoice",
                json!([["type", "=", "out_invoice"], ["state", "=", "draft"]]),
                None,
            )
            .await?;
        self.session.button("account.invoice", "post", &drafts).await?;
        tracing::info!("🧮 {} customer invoices posted", drafts.len());
        Ok(())
    }
}
