use crate::error::{ModelError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::IncomeStatement,
        StatementKind::BalanceSheet,
        StatementKind::CashFlow,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            StatementKind::IncomeStatement => "Income Statement",
            StatementKind::BalanceSheet => "Balance Sheet",
            StatementKind::CashFlow => "Cash Flow Statement",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Category {
    #[schemars(description = "Resources owned by the company (Balance Sheet, debit balance)")]
    Asset,

    #[schemars(description = "Obligations owed to creditors (Balance Sheet, credit balance)")]
    Liability,

    #[schemars(description = "Owners' residual interest (Balance Sheet, credit balance)")]
    Equity,

    #[schemars(description = "Not part of the balance sheet buckets (headers, subtotals, P&L and cash-flow lines)")]
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Sign {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RollupTerm {
    pub key: String,
    pub sign: Sign,
}

/// Forecast assumption codes, rendered as the `ASSUMP` namespace keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssumptionCode {
    RevGrowth,
    TaxRateRev,
    SellRate,
    ManageRate,
    RdRate,
    IncomeTaxRate,
    Dso,
    Dio,
    Dpo,
    CapexRate,
    DivPayout,
}

impl AssumptionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssumptionCode::RevGrowth => "REV_GROWTH",
            AssumptionCode::TaxRateRev => "TAX_RATE_REV",
            AssumptionCode::SellRate => "SELL_RATE",
            AssumptionCode::ManageRate => "MANAGE_RATE",
            AssumptionCode::RdRate => "RD_RATE",
            AssumptionCode::IncomeTaxRate => "INCOME_TAX_RATE",
            AssumptionCode::Dso => "DSO",
            AssumptionCode::Dio => "DIO",
            AssumptionCode::Dpo => "DPO",
            AssumptionCode::CapexRate => "CAPEX_RATE",
            AssumptionCode::DivPayout => "DIV_PAYOUT",
        }
    }
}

impl fmt::Display for AssumptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a line item is filled in forecast years (and, for schedule-backed
/// balance sheet lines, in every year).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "PascalCase", tag = "driver")]
pub enum ForecastDriver {
    #[schemars(description = "Shown in History only; not forecast")]
    HistoryOnly,

    #[schemars(description = "Canonical revenue total from the revenue build-up")]
    Revenue,

    #[schemars(description = "Canonical cost total from the revenue build-up")]
    Cost,

    #[schemars(description = "Forecast denominator line multiplied by a ratio assumption")]
    Ratio { assumption: AssumptionCode },

    #[schemars(description = "Interest line of the debt schedule")]
    Interest,

    #[schemars(description = "Flat share of revenue (approximation for uncategorized lines)")]
    Fallback,

    #[schemars(description = "Signed sum of other lines of the same statement")]
    Subtotal { terms: Vec<RollupTerm> },

    #[schemars(description = "Closing cash from the cash-flow statement")]
    Cash,

    #[schemars(description = "Receivables from the working-capital schedule")]
    Receivables,

    #[schemars(description = "Inventory from the working-capital schedule")]
    Inventory,

    #[schemars(description = "Ending PPE from the capex schedule")]
    FixedAssets,

    #[schemars(description = "Debt balance from the debt schedule")]
    ShortTermDebt,

    #[schemars(description = "Prior balance plus retained share of net profit")]
    RetainedEarnings,

    #[schemars(description = "Held flat at the prior period's value")]
    CarryForward,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct CanonicalLineItem {
    #[schemars(description = "Row label shown in every sheet that renders this line")]
    pub label: String,

    #[schemars(description = "Canonical uppercase key; empty for pure section headers")]
    pub key: String,

    #[schemars(description = "Indentation level, 0 to 2")]
    pub indent: u8,

    pub is_subtotal: bool,

    #[schemars(description = "Balance sheet bucket of this line")]
    pub category: Category,

    pub driver: ForecastDriver,
}

impl CanonicalLineItem {
    pub fn is_header(&self) -> bool {
        self.key.is_empty()
    }

    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }

    fn in_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum AssumptionKind {
    #[schemars(description = "numerator / denominator")]
    Ratio,

    #[schemars(description = "numerator / denominator x days per year (turnover cycle in days)")]
    DayCount,

    #[schemars(description = "Period-over-period relative change of the numerator")]
    Growth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ForecastAssumption {
    pub code: AssumptionCode,
    pub display_name: String,
    pub numerator_key: String,
    pub denominator_key: String,
    #[schemars(description = "Used as the forecast input when the History inputs are not available")]
    pub default_value: f64,
    pub kind: AssumptionKind,
}

impl ForecastAssumption {
    pub fn is_day_count(&self) -> bool {
        self.kind == AssumptionKind::DayCount
    }
}

/// The canonical accounting taxonomy plus forecast assumption definitions.
///
/// Built once (usually via [`SchemaRegistry::standard`]) and passed by
/// reference into every pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchemaRegistry {
    income_statement: Vec<CanonicalLineItem>,
    balance_sheet: Vec<CanonicalLineItem>,
    cash_flow: Vec<CanonicalLineItem>,
    assumptions: Vec<ForecastAssumption>,
}

impl SchemaRegistry {
    pub fn new(
        income_statement: Vec<CanonicalLineItem>,
        balance_sheet: Vec<CanonicalLineItem>,
        cash_flow: Vec<CanonicalLineItem>,
        assumptions: Vec<ForecastAssumption>,
    ) -> Result<Self> {
        let registry = Self {
            income_statement,
            balance_sheet,
            cash_flow,
            assumptions,
        };
        registry.validate()?;
        Ok(registry)
    }

    pub fn standard() -> Self {
        Self {
            income_statement: standard_income_statement(),
            balance_sheet: standard_balance_sheet(),
            cash_flow: standard_cash_flow(),
            assumptions: standard_assumptions(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let registry: SchemaRegistry = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn statement(&self, kind: StatementKind) -> &[CanonicalLineItem] {
        match kind {
            StatementKind::IncomeStatement => &self.income_statement,
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }

    pub fn assumptions(&self) -> &[ForecastAssumption] {
        &self.assumptions
    }

    pub fn assumption(&self, code: AssumptionCode) -> Option<&ForecastAssumption> {
        self.assumptions.iter().find(|a| a.code == code)
    }

    pub fn find(&self, kind: StatementKind, key: &str) -> Option<&CanonicalLineItem> {
        self.statement(kind).iter().find(|item| item.key == key)
    }

    /// Every canonical key across all statements, in display order.
    pub fn canonical_keys(&self) -> impl Iterator<Item = &str> {
        StatementKind::ALL
            .into_iter()
            .flat_map(move |kind| self.statement(kind).iter())
            .filter(|item| item.has_key())
            .map(|item| item.key.as_str())
    }

    pub fn validate(&self) -> Result<()> {
        for kind in StatementKind::ALL {
            let items = self.statement(kind);
            let mut seen: HashSet<&str> = HashSet::new();

            for item in items {
                if item.indent > 2 {
                    return Err(ModelError::InvalidSchema(format!(
                        "{} line '{}' has indent {} (expected 0..=2)",
                        kind.title(),
                        item.label,
                        item.indent
                    )));
                }
                if item.has_key() && !seen.insert(item.key.as_str()) {
                    return Err(ModelError::InvalidSchema(format!(
                        "Duplicate canonical key '{}' in {}",
                        item.key,
                        kind.title()
                    )));
                }
            }

            for item in items {
                match &item.driver {
                    ForecastDriver::Subtotal { terms } => {
                        if let Some(term) = terms.iter().find(|t| !seen.contains(t.key.as_str())) {
                            return Err(ModelError::InvalidSchema(format!(
                                "Rollup of '{}' references unknown key '{}'",
                                item.key, term.key
                            )));
                        }
                    }
                    ForecastDriver::Ratio { assumption } => {
                        let definition = self.assumption(*assumption).ok_or_else(|| {
                            ModelError::InvalidSchema(format!(
                                "Line '{}' is driven by undefined assumption {}",
                                item.key, assumption
                            ))
                        })?;
                        if !seen.contains(definition.denominator_key.as_str()) {
                            return Err(ModelError::InvalidSchema(format!(
                                "Assumption {} denominator '{}' is not a line of the {}",
                                assumption,
                                definition.denominator_key,
                                kind.title()
                            )));
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut codes = HashSet::new();
        for assumption in &self.assumptions {
            if !codes.insert(assumption.code) {
                return Err(ModelError::InvalidSchema(format!(
                    "Assumption {} is defined twice",
                    assumption.code
                )));
            }
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SchemaRegistry)
    }
}

fn header(label: &str) -> CanonicalLineItem {
    CanonicalLineItem {
        label: label.to_string(),
        key: String::new(),
        indent: 0,
        is_subtotal: true,
        category: Category::None,
        driver: ForecastDriver::HistoryOnly,
    }
}

fn line(label: &str, key: &str, indent: u8, driver: ForecastDriver) -> CanonicalLineItem {
    CanonicalLineItem {
        label: label.to_string(),
        key: key.to_string(),
        indent,
        is_subtotal: false,
        category: Category::None,
        driver,
    }
}

fn total(label: &str, key: &str, indent: u8, driver: ForecastDriver) -> CanonicalLineItem {
    CanonicalLineItem {
        is_subtotal: true,
        ..line(label, key, indent, driver)
    }
}

fn rollup(terms: &[(&str, Sign)]) -> ForecastDriver {
    ForecastDriver::Subtotal {
        terms: terms
            .iter()
            .map(|(key, sign)| RollupTerm {
                key: key.to_string(),
                sign: *sign,
            })
            .collect(),
    }
}

fn ratio(assumption: AssumptionCode) -> ForecastDriver {
    ForecastDriver::Ratio { assumption }
}

fn standard_income_statement() -> Vec<CanonicalLineItem> {
    use ForecastDriver::{Cost, Fallback, Interest, Revenue};
    use Sign::{Minus, Plus};

    vec![
        total("Total operating revenue", "TOTAL_OPERATE_INCOME", 0, Revenue),
        line("Operating revenue", "OPERATE_INCOME", 1, Revenue),
        total(
            "Total operating cost",
            "TOTAL_OPERATE_COST",
            0,
            rollup(&[
                ("OPERATE_COST", Plus),
                ("TAX_BUSINESSSURCHARGE", Plus),
                ("SALE_EXPENSE", Plus),
                ("MANAGE_EXPENSE", Plus),
                ("RESEARCH_EXPENSE", Plus),
                ("FINANCE_EXPENSE", Plus),
            ]),
        ),
        line("Operating cost", "OPERATE_COST", 1, Cost),
        line("Taxes and surcharges", "TAX_BUSINESSSURCHARGE", 1, ratio(AssumptionCode::TaxRateRev)),
        line("Selling expenses", "SALE_EXPENSE", 1, ratio(AssumptionCode::SellRate)),
        line("Administrative expenses", "MANAGE_EXPENSE", 1, ratio(AssumptionCode::ManageRate)),
        line("R&D expenses", "RESEARCH_EXPENSE", 1, ratio(AssumptionCode::RdRate)),
        line("Financial expenses", "FINANCE_EXPENSE", 1, Interest),
        line("of which: interest expense", "INTEREST_EXPENSE", 2, Interest),
        line("interest income", "INTEREST_INCOME", 2, Fallback),
        line("Other income", "OTHER_INCOME", 1, Fallback),
        line("Investment income", "INVEST_INCOME", 1, Fallback),
        line("Fair value change gains", "FAIRVALUE_CHANGE_INCOME", 1, Fallback),
        line("Credit impairment losses", "CREDIT_IMPAIRMENT_LOSS", 1, Fallback),
        line("Asset impairment losses", "ASSET_IMPAIRMENT_LOSS", 1, Fallback),
        line("Gains on asset disposal", "ASSET_DISPOSAL_INCOME", 1, Fallback),
        total(
            "Operating profit",
            "OPERATE_PROFIT",
            0,
            rollup(&[
                ("TOTAL_OPERATE_INCOME", Plus),
                ("TOTAL_OPERATE_COST", Minus),
                ("OTHER_INCOME", Plus),
                ("INVEST_INCOME", Plus),
                ("FAIRVALUE_CHANGE_INCOME", Plus),
                ("CREDIT_IMPAIRMENT_LOSS", Plus),
                ("ASSET_IMPAIRMENT_LOSS", Plus),
                ("ASSET_DISPOSAL_INCOME", Plus),
            ]),
        ),
        line("Non-operating income", "NONBUSINESS_INCOME", 1, Fallback),
        line("Non-operating expenses", "NONBUSINESS_EXPENSE", 1, Fallback),
        total(
            "Total profit",
            "TOTAL_PROFIT",
            0,
            rollup(&[
                ("OPERATE_PROFIT", Plus),
                ("NONBUSINESS_INCOME", Plus),
                ("NONBUSINESS_EXPENSE", Minus),
            ]),
        ),
        line("Income tax expense", "INCOME_TAX", 1, ratio(AssumptionCode::IncomeTaxRate)),
        total(
            "Net profit",
            "NETPROFIT",
            0,
            rollup(&[("TOTAL_PROFIT", Plus), ("INCOME_TAX", Minus)]),
        ),
        total(
            "Net profit attributable to parent",
            "PARENT_NETPROFIT",
            1,
            rollup(&[("NETPROFIT", Plus), ("MINORITY_INTEREST", Minus)]),
        ),
        line("Minority interest", "MINORITY_INTEREST", 1, Fallback),
        total(
            "EBIT (reference)",
            "EBIT_CALC",
            0,
            rollup(&[("TOTAL_PROFIT", Plus), ("FINANCE_EXPENSE", Plus)]),
        ),
        // D&A add-back intentionally omitted; EBITDA mirrors EBIT.
        total("EBITDA (reference)", "EBITDA_CALC", 0, rollup(&[("EBIT_CALC", Plus)])),
    ]
}

fn standard_balance_sheet() -> Vec<CanonicalLineItem> {
    use Category::{Asset, Equity, Liability};
    use ForecastDriver::{CarryForward, HistoryOnly};

    let asset = |label: &str, key: &str, driver: ForecastDriver| line(label, key, 1, driver).in_category(Asset);
    let liability = |label: &str, key: &str, driver: ForecastDriver| line(label, key, 1, driver).in_category(Liability);
    let equity = |label: &str, key: &str, driver: ForecastDriver| line(label, key, 1, driver).in_category(Equity);

    vec![
        header("Current assets:"),
        asset("Cash and cash equivalents", "MONETARYFUNDS", ForecastDriver::Cash),
        asset("Trading financial assets", "TRADE_FINASSET_NOTFVTPL", CarryForward),
        asset("Notes receivable", "NOTES_RECE", CarryForward),
        asset("Accounts receivable", "ACCOUNTS_RECE", ForecastDriver::Receivables),
        asset("Receivables financing", "RECEIVABLE_FINANCING", CarryForward),
        asset("Prepayments", "PREPAYMENT", CarryForward),
        asset("Other receivables", "OTHER_RECE", CarryForward),
        asset("Inventory", "INVENTORY", ForecastDriver::Inventory),
        asset("Contract assets", "CONTRACT_ASSET", CarryForward),
        asset("Non-current assets due within one year", "NONCURRENT_ASSET_ONE_YEAR", CarryForward),
        asset("Other current assets", "OTHER_CURRENT_ASSET", CarryForward),
        total("Total current assets", "TOTAL_CURRENT_ASSETS", 0, HistoryOnly),
        header("Non-current assets:"),
        asset("Long-term equity investments", "LONG_EQUITY_INVEST", CarryForward),
        asset("Other equity instrument investments", "OTHER_EQUITY_INVEST", CarryForward),
        asset("Investment property", "INVEST_REALESTATE", CarryForward),
        asset("Fixed assets", "FIXED_ASSET", ForecastDriver::FixedAssets),
        asset("Construction in progress", "CONSTRUCTION_IN_PROCESS", CarryForward),
        asset("Right-of-use assets", "RIGHT_USE_ASSETS", CarryForward),
        asset("Intangible assets", "INTANGIBLE_ASSET", CarryForward),
        asset("Goodwill", "GOODWILL", CarryForward),
        asset("Long-term prepaid expenses", "LONG_PREPAID_EXPENSE", CarryForward),
        asset("Deferred tax assets", "DEFERRED_TAX_ASSET", CarryForward),
        asset("Other non-current assets", "OTHER_NONCURRENT_ASSET", CarryForward),
        total("Total non-current assets", "TOTAL_NONCURRENT_ASSETS", 0, HistoryOnly),
        total("Total assets", "TOTAL_ASSETS", 0, HistoryOnly),
        header("Current liabilities:"),
        liability("Short-term borrowings", "SHORT_LOAN", ForecastDriver::ShortTermDebt),
        liability("Notes payable", "NOTES_PAYABLE", CarryForward),
        liability("Accounts payable", "ACCOUNTS_PAYABLE", CarryForward),
        liability("Advances from customers", "PRECEIVE", CarryForward),
        liability("Contract liabilities", "CONTRACT_LIABILITIES", CarryForward),
        liability("Payroll payable", "PAYROLL_PAYABLE", CarryForward),
        liability("Taxes payable", "TAX_PAYABLE", CarryForward),
        liability("Other payables", "OTHER_PAYABLE", CarryForward),
        liability("Non-current liabilities due within one year", "NONCURRENT_LIAB_ONE_YEAR", CarryForward),
        liability("Other current liabilities", "OTHER_CURRENT_LIAB", CarryForward),
        total("Total current liabilities", "TOTAL_CURRENT_LIAB", 0, HistoryOnly),
        header("Non-current liabilities:"),
        liability("Long-term borrowings", "LONG_LOAN", CarryForward),
        liability("Bonds payable", "BOND_PAYABLE", CarryForward),
        liability("Lease liabilities", "LEASE_LIAB", CarryForward),
        liability("Long-term payables", "LONG_PAYABLE", CarryForward),
        liability("Deferred revenue", "DEFERRED_REVENUE", CarryForward),
        liability("Deferred tax liabilities", "DEFERRED_TAX_LIAB", CarryForward),
        liability("Provisions", "ANTICIPATE_LIAB", CarryForward),
        liability("Other non-current liabilities", "OTHER_NONCURRENT_LIAB", CarryForward),
        total("Total non-current liabilities", "TOTAL_NONCURRENT_LIAB", 0, HistoryOnly),
        total("Total liabilities", "TOTAL_LIABILITIES", 0, HistoryOnly),
        header("Shareholders' equity:"),
        equity("Share capital", "SHARE_CAPITAL", CarryForward),
        equity("Capital reserve", "CAPITAL_RESERVE", CarryForward),
        equity("Surplus reserve", "SURPLUS_RESERVE", CarryForward),
        equity("Retained earnings", "UNDISTRIBUTED_PROFIT", ForecastDriver::RetainedEarnings),
        total("Equity attributable to parent", "TOTAL_EQUITY", 0, HistoryOnly),
        equity("Minority interests", "MINORITY_EQUITY", CarryForward),
        total("Total liabilities and equity (reported)", "TOTAL_LIAB_EQUITY", 0, HistoryOnly),
        total("Total liabilities and equity (reconciled)", "TOTAL_LIABILITIES_AND_EQUITY_CALC", 0, HistoryOnly),
        total("Balance check", "BALANCE_CHECK", 0, HistoryOnly),
    ]
}

fn standard_cash_flow() -> Vec<CanonicalLineItem> {
    use ForecastDriver::HistoryOnly;

    let item = |label: &str, key: &str| line(label, key, 1, HistoryOnly);
    let subtotal = |label: &str, key: &str| total(label, key, 0, HistoryOnly);

    vec![
        header("Cash flows from operating activities:"),
        item("Cash received from sales of goods and services", "SALES_SERVICES"),
        item("Tax refunds received", "RECEIVE_TAX_REFUND"),
        item("Other cash received from operating activities", "RECEIVE_OTHER_OPERATE"),
        subtotal("Operating cash inflows", "TOTAL_OPERATE_INFLOW"),
        item("Cash paid for goods and services", "BUY_GOODS_SERVICES"),
        item("Cash paid to and on behalf of employees", "PAY_STAFF_CASH"),
        item("Taxes paid", "PAY_ALL_TAX"),
        item("Other cash paid for operating activities", "PAY_OTHER_OPERATE"),
        subtotal("Operating cash outflows", "TOTAL_OPERATE_OUTFLOW"),
        subtotal("Net cash from operating activities", "NETCASH_OPERATE"),
        header("Cash flows from investing activities:"),
        item("Cash received from disposal of investments", "WITHDRAW_INVEST"),
        item("Cash received from investment income", "INVEST_INCOME_CASH"),
        item("Net cash from disposal of long-term assets", "DISPOSAL_LONG_ASSET"),
        subtotal("Investing cash inflows", "TOTAL_INVEST_INFLOW"),
        item("Cash paid for fixed, intangible and other long-term assets", "CONSTRUCT_LONG_ASSET"),
        item("Cash paid for investments", "INVEST_PAY_CASH"),
        subtotal("Investing cash outflows", "TOTAL_INVEST_OUTFLOW"),
        subtotal("Net cash from investing activities", "NETCASH_INVEST"),
        header("Cash flows from financing activities:"),
        item("Cash received from capital contributions", "ABSORB_INVEST_RECEIVED"),
        item("Cash received from borrowings", "BORROW_CASH"),
        subtotal("Financing cash inflows", "TOTAL_FINANCE_INFLOW"),
        item("Cash repayments of debt", "PAY_DEBT_CASH"),
        item("Dividends, profit distributions and interest paid", "ASSIGN_DIVIDEND_PORFIT"),
        subtotal("Financing cash outflows", "TOTAL_FINANCE_OUTFLOW"),
        subtotal("Net cash from financing activities", "NETCASH_FINANCE"),
        subtotal("Net increase in cash and cash equivalents", "CASH_NETINCREASE"),
        subtotal("Cash and cash equivalents at end of year", "YEAR_END_CASH"),
        header("Supplementary information:"),
        item("Depreciation of fixed assets", "FA_IR_DEPR"),
    ]
}

fn standard_assumptions() -> Vec<ForecastAssumption> {
    use AssumptionKind::{DayCount, Growth, Ratio};

    let assumption = |code, name: &str, numerator: &str, denominator: &str, default_value, kind| {
        ForecastAssumption {
            code,
            display_name: name.to_string(),
            numerator_key: numerator.to_string(),
            denominator_key: denominator.to_string(),
            default_value,
            kind,
        }
    };

    vec![
        assumption(AssumptionCode::RevGrowth, "Revenue growth (YoY)", "TOTAL_OPERATE_INCOME", "TOTAL_OPERATE_INCOME", 0.10, Growth),
        assumption(AssumptionCode::TaxRateRev, "Taxes and surcharges (% of revenue)", "TAX_BUSINESSSURCHARGE", "TOTAL_OPERATE_INCOME", 0.005, Ratio),
        assumption(AssumptionCode::SellRate, "Selling expenses (% of revenue)", "SALE_EXPENSE", "TOTAL_OPERATE_INCOME", 0.04, Ratio),
        assumption(AssumptionCode::ManageRate, "Administrative expenses (% of revenue)", "MANAGE_EXPENSE", "TOTAL_OPERATE_INCOME", 0.03, Ratio),
        assumption(AssumptionCode::RdRate, "R&D expenses (% of revenue)", "RESEARCH_EXPENSE", "TOTAL_OPERATE_INCOME", 0.02, Ratio),
        assumption(AssumptionCode::IncomeTaxRate, "Effective income tax rate (% of EBT)", "INCOME_TAX", "TOTAL_PROFIT", 0.15, Ratio),
        assumption(AssumptionCode::Dso, "Days sales outstanding (DSO)", "ACCOUNTS_RECE", "TOTAL_OPERATE_INCOME", 30.0, DayCount),
        assumption(AssumptionCode::Dio, "Days inventory outstanding (DIO)", "INVENTORY", "OPERATE_COST", 60.0, DayCount),
        assumption(AssumptionCode::Dpo, "Days payables outstanding (DPO)", "ACCOUNTS_PAYABLE", "OPERATE_COST", 60.0, DayCount),
        assumption(AssumptionCode::CapexRate, "Capex (% of revenue)", "CONSTRUCT_LONG_ASSET", "TOTAL_OPERATE_INCOME", 0.05, Ratio),
        assumption(AssumptionCode::DivPayout, "Dividend payout (% of net profit)", "ASSIGN_DIVIDEND_PORFIT", "NETPROFIT", 0.30, Ratio),
    ]
}
