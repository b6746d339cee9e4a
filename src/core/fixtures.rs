use crate::core::{ChartSelection, DemoLoader, InstallReport, Result, TaskError};
use chrono::{Datelike, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// 執行 fixture 步驟時的上下文
#[derive(Debug, Clone)]
pub struct FixtureContext<'a> {
    pub report: &'a InstallReport,
    pub language: String,
    pub today: NaiveDate,
    pub company_name: String,
}

impl<'a> FixtureContext<'a> {
    pub fn new(report: &'a InstallReport, language: &str, today: NaiveDate) -> Self {
        Self {
            report,
            language: language.to_string(),
            today,
            company_name: crate::config::trytond_config::DEFAULT_COMPANY_NAME.to_string(),
        }
    }

    pub fn with_company_name(mut self, name: &str) -> Self {
        self.company_name = name.to_string();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    SpanishBanks,
    SpanishSubdivisions,
    Company,
    Accounts,
    PaymentTypes,
    Parties,
    Products,
    PriceLists,
    Sales,
    Opportunities,
    Purchases,
    Productions,
    Stock,
    CustomerInvoices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Enabled,
    /// Kept in the plan but only runs when enabled as an extension.
    Disabled { reason: &'static str },
}

/// A (predicate, step) pair: runs `kind` when `module` transitioned this run.
#[derive(Debug, Clone)]
pub struct GatedStep {
    pub name: &'static str,
    pub module: &'static str,
    pub message: &'static str,
    pub kind: StepKind,
    pub availability: Availability,
}

impl GatedStep {
    const fn enabled(name: &'static str, module: &'static str, message: &'static str, kind: StepKind) -> Self {
        Self {
            name,
            module,
            message,
            kind,
            availability: Availability::Enabled,
        }
    }

    const fn disabled(
        name: &'static str,
        module: &'static str,
        message: &'static str,
        kind: StepKind,
        reason: &'static str,
    ) -> Self {
        Self {
            name,
            module,
            message,
            kind,
            availability: Availability::Disabled { reason },
        }
    }

    pub fn should_execute(&self, context: &FixtureContext<'_>) -> bool {
        context.report.transitioned(self.module)
    }

    async fn run(&self, context: &FixtureContext<'_>, loader: &dyn DemoLoader) -> Result<()> {
        match self.kind {
            StepKind::SpanishBanks => loader.load_banks().await,
            StepKind::SpanishSubdivisions => loader.load_subdivisions().await,
            StepKind::Company => loader.create_company(&context.company_name).await,
            StepKind::Accounts => {
                let year = context.today.year();
                loader.create_fiscal_year(year - 1).await?;
                loader.create_fiscal_year(year).await?;
                loader.create_payment_terms().await?;
                let chart = ChartSelection::select(&context.report.to_install, &context.language);
                tracing::debug!("📒 Chart template {}.{}", chart.module, chart.fs_id);
                loader.create_account_chart(&chart).await?;
                loader.create_taxes().await
            }
            StepKind::PaymentTypes => loader.create_payment_types().await,
            StepKind::Parties => loader.create_parties().await,
            StepKind::Products => {
                loader.create_product_categories().await?;
                loader.create_products().await
            }
            StepKind::PriceLists => loader.create_price_lists().await,
            StepKind::Sales => {
                loader.create_sales().await?;
                loader.process_sales().await
            }
            StepKind::Opportunities => {
                loader.create_opportunities().await?;
                loader.process_opportunities().await
            }
            StepKind::Purchases => {
                loader.create_purchases().await?;
                loader.process_purchases().await
            }
            StepKind::Productions => {
                loader.create_boms().await?;
                loader.create_production_requests().await
            }
            StepKind::Stock => {
                loader.create_inventory().await?;
                println!("Process Stock Shipments...");
                loader.process_customer_shipments().await?;
                loader.process_supplier_shipments().await
            }
            StepKind::CustomerInvoices => loader.process_customer_invoices().await,
        }
    }
}

/// 依序排列的 fixture 步驟；順序即相依關係
#[derive(Debug, Clone)]
pub struct FixturePlan {
    steps: Vec<GatedStep>,
    extensions: HashSet<String>,
}

impl FixturePlan {
    pub fn standard() -> Self {
        use StepKind::*;
        let steps = vec![
            GatedStep::enabled("spanish_banks", "bank_es", "Load Spanish Banks...", SpanishBanks),
            GatedStep::enabled(
                "spanish_subdivisions",
                "country_zip_es",
                "Load Spanish cities and subdivisions...",
                SpanishSubdivisions,
            ),
            GatedStep::enabled("company", "company", "Create company...", Company),
            GatedStep::enabled("accounts", "account", "Create accounts...", Accounts),
            GatedStep::enabled(
                "payment_types",
                "account_payment_type",
                "Create payment types...",
                PaymentTypes,
            ),
            GatedStep::enabled("parties", "party", "Create parties...", Parties),
            GatedStep::enabled("products", "product", "Create products...", Products),
            GatedStep::disabled(
                "price_lists",
                "product_price_list",
                "Create price lists...",
                PriceLists,
                "price list formulas differ between server versions",
            ),
            GatedStep::enabled("sales", "sale", "Create sales...", Sales),
            GatedStep::enabled(
                "opportunities",
                "sale_opportunity",
                "Create sale opportunities...",
                Opportunities,
            ),
            GatedStep::disabled(
                "purchases",
                "purchase",
                "Create purchases...",
                Purchases,
                "purchase processing needs supplier accounts on parties",
            ),
            GatedStep::disabled(
                "productions",
                "production",
                "Create productions...",
                Productions,
                "needs a stock warehouse with production locations",
            ),
            GatedStep::disabled(
                "stock",
                "stock",
                "Create Stock Inventory...",
                Stock,
                "shipment processing depends on purchases and sales being processed",
            ),
            // `account_invoice` is only in `to_install` when it was requested
            // explicitly; the default module list never names it.
            GatedStep::enabled(
                "customer_invoices",
                "account_invoice",
                "Process Customer Invoices...",
                CustomerInvoices,
            ),
        ];
        Self {
            steps,
            extensions: HashSet::new(),
        }
    }

    /// 啟用被停用的步驟 (以步驟名稱指定)
    pub fn with_extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.steps.iter().any(|s| s.name == name) {
                tracing::warn!("⚠️ Unknown fixture extension ignored: {}", name);
                continue;
            }
            self.extensions.insert(name);
        }
        self
    }

    pub fn steps(&self) -> &[GatedStep] {
        &self.steps
    }

    pub fn is_active(&self, step: &GatedStep) -> bool {
        match step.availability {
            Availability::Enabled => true,
            Availability::Disabled { .. } => self.extensions.contains(step.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Executed { duration: Duration },
    SkippedNotInstalled,
    SkippedDisabled,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub step_name: String,
    pub module: String,
    pub outcome: StepOutcome,
}

impl StepResult {
    pub fn executed(&self) -> bool {
        matches!(self.outcome, StepOutcome::Executed { .. })
    }
}

/// 依計畫順序執行 fixture 步驟；失敗即中止，已建立的資料不會回滾
pub struct FixtureSequence {
    plan: FixturePlan,
}

impl FixtureSequence {
    pub fn new(plan: FixturePlan) -> Self {
        Self { plan }
    }

    pub async fn execute_all(
        &self,
        context: &FixtureContext<'_>,
        loader: &dyn DemoLoader,
    ) -> Result<Vec<StepResult>> {
        let mut results = Vec::with_capacity(self.plan.steps().len());

        for step in self.plan.steps() {
            let outcome = if !step.should_execute(context) {
                tracing::debug!("⏭️ Skipping fixture: {} ({} not installed this run)", step.name, step.module);
                StepOutcome::SkippedNotInstalled
            } else if !self.plan.is_active(step) {
                if let Availability::Disabled { reason } = step.availability {
                    tracing::info!("⏸️ Fixture disabled: {} ({})", step.name, reason);
                }
                StepOutcome::SkippedDisabled
            } else {
                println!("{}", step.message);
                tracing::info!("▶️ {}", step.message);
                let start_time = Instant::now();

                if let Err(e) = step.run(context, loader).await {
                    tracing::error!("❌ Fixture step failed: {}", e);
                    return Err(TaskError::FixtureError {
                        step: step.name.to_string(),
                        details: e.to_string(),
                    });
                }

                let duration = start_time.elapsed();
                tracing::info!("✅ Fixture executed: {} (duration: {:?})", step.name, duration);
                StepOutcome::Executed { duration }
            };

            results.push(StepResult {
                step_name: step.name.to_string(),
                module: step.module.to_string(),
                outcome,
            });
        }

        Ok(results)
    }

    /// 獲取執行摘要
    pub fn get_execution_summary(results: &[StepResult]) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let executed: Vec<serde_json::Value> = results
            .iter()
            .filter(|r| r.executed())
            .map(|r| serde_json::Value::String(r.step_name.clone()))
            .collect();
        let disabled = results
            .iter()
            .filter(|r| r.outcome == StepOutcome::SkippedDisabled)
            .count();
        let total_duration: Duration = results
            .iter()
            .filter_map(|r| match r.outcome {
                StepOutcome::Executed { duration } => Some(duration),
                _ => None,
            })
            .sum();

        summary.insert("total_steps".to_string(), serde_json::Value::Number(results.len().into()));
        summary.insert("disabled_steps".to_string(), serde_json::Value::Number(disabled.into()));
        summary.insert(
            "total_duration_ms".to_string(),
            serde_json::Value::Number((total_duration.as_millis() as u64).into()),
        );
        summary.insert("executed_steps".to_string(), serde_json::Value::Array(executed));

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::RecordingLoader;

    fn report(to_install: &[&str]) -> InstallReport {
        InstallReport {
            to_install: to_install.iter().map(|m| m.to_string()).collect(),
            installed: to_install.iter().map(|m| m.to_string()).collect(),
            dependencies: Vec::new(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_standard_plan_order() {
        let plan = FixturePlan::standard();
        let names: Vec<&str> = plan.steps().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "spanish_banks",
                "spanish_subdivisions",
                "company",
                "accounts",
                "payment_types",
                "parties",
                "products",
                "price_lists",
                "sales",
                "opportunities",
                "purchases",
                "productions",
                "stock",
                "customer_invoices",
            ]
        );
        let disabled: Vec<&str> = plan
            .steps()
            .iter()
            .filter(|s| !plan.is_active(s))
            .map(|s| s.name)
            .collect();
        assert_eq!(disabled, vec!["price_lists", "purchases", "productions", "stock"]);
    }

    #[tokio::test]
    async fn test_company_account_scenario() {
        let report = report(&["company", "account"]);
        let context = FixtureContext::new(&report, "en_US", today());
        let loader = RecordingLoader::default();

        let results = FixtureSequence::new(FixturePlan::standard())
            .execute_all(&context, &loader)
            .await
            .unwrap();

        assert_eq!(
            loader.calls(),
            vec![
                "create_company(TrytonERP)",
                "create_fiscal_year(2025)",
                "create_fiscal_year(2026)",
                "create_payment_terms",
                "create_account_chart(account/account_template_root_en)",
                "create_taxes",
            ]
        );
        let executed: Vec<&str> = results
            .iter()
            .filter(|r| r.executed())
            .map(|r| r.step_name.as_str())
            .collect();
        assert_eq!(executed, vec!["company", "accounts"]);
    }

    #[tokio::test]
    async fn test_ordering_company_before_accounts() {
        let report = report(&[
            "company",
            "party",
            "product",
            "account",
            "account_es",
            "sale",
            "sale_opportunity",
            "account_payment_type",
        ]);
        let context = FixtureContext::new(&report, "es_ES", today());
        let loader = RecordingLoader::default();

        FixtureSequence::new(FixturePlan::standard())
            .execute_all(&context, &loader)
            .await
            .unwrap();

        let company = loader.position("create_company").unwrap();
        let fiscal = loader.position("create_fiscal_year").unwrap();
        let chart = loader.position("create_account_chart(account_es/es)").unwrap();
        let taxes = loader.position("create_taxes").unwrap();
        let parties = loader.position("create_parties").unwrap();
        let sales = loader.position("create_sales").unwrap();
        assert!(company < fiscal && fiscal < chart && chart < taxes);
        assert!(parties < sales);
        assert!(loader.position("process_opportunities").unwrap() > sales);
        assert!(loader.position("process_customer_invoices").is_none());
    }

    #[tokio::test]
    async fn test_empty_report_runs_nothing() {
        let report = InstallReport::default();
        let context = FixtureContext::new(&report, "en_US", today());
        let loader = RecordingLoader::default();

        let results = FixtureSequence::new(FixturePlan::standard())
            .execute_all(&context, &loader)
            .await
            .unwrap();

        assert!(loader.calls().is_empty());
        assert!(results.iter().all(|r| r.outcome == StepOutcome::SkippedNotInstalled));
    }

    #[tokio::test]
    async fn test_disabled_steps_need_extension() {
        let report = report(&["purchase", "stock"]);
        let context = FixtureContext::new(&report, "en_US", today());

        let loader = RecordingLoader::default();
        let results = FixtureSequence::new(FixturePlan::standard())
            .execute_all(&context, &loader)
            .await
            .unwrap();
        assert!(loader.calls().is_empty());
        let purchases = results.iter().find(|r| r.step_name == "purchases").unwrap();
        assert_eq!(purchases.outcome, StepOutcome::SkippedDisabled);

        let loader = RecordingLoader::default();
        let plan = FixturePlan::standard().with_extensions(["purchases", "not_a_step"]);
        FixtureSequence::new(plan)
            .execute_all(&context, &loader)
            .await
            .unwrap();
        assert_eq!(loader.calls(), vec!["create_purchases", "process_purchases"]);
    }

    #[tokio::test]
    async fn test_customer_invoices_only_when_requested() {
        let report = report(&["account_invoice"]);
        let context = FixtureContext::new(&report, "en_US", today());
        let loader = RecordingLoader::default();

        FixtureSequence::new(FixturePlan::standard())
            .execute_all(&context, &loader)
            .await
            .unwrap();

        assert_eq!(loader.calls(), vec!["process_customer_invoices"]);
    }

    #[tokio::test]
    async fn test_failure_stops_sequence() {
        let report = report(&["company", "account", "party"]);
        let context = FixtureContext::new(&report, "en_US", today()).with_company_name("Gal");
        let loader = RecordingLoader::failing_on("create_account_chart");

        let err = FixtureSequence::new(FixturePlan::standard())
            .execute_all(&context, &loader)
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::FixtureError { ref step, .. } if step == "accounts"));
        assert_eq!(loader.calls()[0], "create_company(Gal)");
        assert!(loader.position("create_parties").is_none());
    }

    #[tokio::test]
    async fn test_execution_summary() {
        let report = report(&["party", "purchase"]);
        let context = FixtureContext::new(&report, "en_US", today());
        let loader = RecordingLoader::default();

        let results = FixtureSequence::new(FixturePlan::standard())
            .execute_all(&context, &loader)
            .await
            .unwrap();
        let summary = FixtureSequence::get_execution_summary(&results);

        assert_eq!(summary["total_steps"], serde_json::json!(14));
        assert_eq!(summary["disabled_steps"], serde_json::json!(1));
        assert_eq!(summary["executed_steps"], serde_json::json!(["parties"]));
    }
}
