use financial_model_builder::*;
use serde_json::json;

/// Three years of statements for a fictional company, in source currency units.
fn sample_statements() -> serde_json::Result<RawStatements> {
    let years = [
        ("2022-12-31 00:00:00", 1.00),
        ("2023-12-31 00:00:00", 1.15),
        ("2024-12-31 00:00:00", 1.30),
    ];
    let m = 1_000_000.0;

    let mut statements = RawStatements::default();
    for (date, scale) in years {
        let income = json!({
            "REPORT_DATE": date,
            "TOTAL_OPERATE_INCOME": 5_000.0 * m * scale,
            "OPERATE_INCOME": 5_000.0 * m * scale,
            "TOTAL_OPERATE_COST": 4_300.0 * m * scale,
            "OPERATE_COST": 3_600.0 * m * scale,
            "TAX_BUSINESSSURCHARGE": 30.0 * m * scale,
            "SALE_EXPENSE": 250.0 * m * scale,
            "MANAGE_EXPENSE": 180.0 * m * scale,
            "RESEARCH_EXPENSE": 120.0 * m * scale,
            "FINANCE_EXPENSE": 40.0 * m * scale,
            "OPERATE_PROFIT": 700.0 * m * scale,
            "TOTAL_PROFIT": 700.0 * m * scale,
            "INCOME_TAX": 175.0 * m * scale,
            "NETPROFIT": 525.0 * m * scale,
            "PARENT_NETPROFIT": "510000000",
        });
        let balance = json!({
            "REPORT_DATE": date,
            "MONETARYFUNDS": 900.0 * m * scale,
            "ACCOUNTS_RECE": 400.0 * m * scale,
            "INVENTORY": 600.0 * m * scale,
            "FIXED_ASSET": 1_500.0 * m * scale,
            "TOTAL_ASSETS": 3_400.0 * m * scale,
            "SHORT_LOAN": 800.0 * m * scale,
            "ACCOUNTS_PAYABLE": 500.0 * m * scale,
            "TOTAL_LIABILITIES": 1_300.0 * m * scale,
            "SHARE_CAPITAL": 1_000.0 * m * scale,
            "UNDISTRIBUTED_PROFIT": 1_100.0 * m * scale,
            "TOTAL_EQUITY": 2_100.0 * m * scale,
            "TOTAL_LIAB_EQUITY": 3_400.0 * m * scale,
        });
        let cash_flow = json!({
            "REPORT_DATE": date,
            "NETCASH_OPERATE": 650.0 * m * scale,
            "CONSTRUCT_LONG_ASSET": 250.0 * m * scale,
            "FA_IR_DEPR": 150.0 * m * scale,
            "ASSIGN_DIVIDEND_PORFIT": 160.0 * m * scale,
            "CASH_NETINCREASE": 120.0 * m * scale,
        });

        statements.income.push(serde_json::from_value(income)?);
        statements.balance.push(serde_json::from_value(balance)?);
        statements.cash_flow.push(serde_json::from_value(cash_flow)?);
    }
    Ok(statements)
}

fn main() -> anyhow::Result<()> {
    println!("📊 Financial Model Builder Demo\n");

    let security = SecurityId::new("000895");
    let config = ModelConfig {
        as_of_year: Some(2025),
        output_dir: "demo_output".into(),
        assumption_overrides: AssumptionOverrides::default()
            .set_all(AssumptionCode::RevGrowth, 0.08)
            .set_year(AssumptionCode::RevGrowth, 2025, 0.12),
        ..ModelConfig::default()
    };

    let source = InMemorySource::new().with(security.as_str(), sample_statements()?);
    let builder = ModelBuilder::new(source, config)?;

    let Some(model) = builder.build(&security)? else {
        println!("⚠️  No data for {}", security);
        return Ok(());
    };

    let summary = &model.summary;
    println!("✅ Built model for {} ({})", security, security.symbol());
    println!("   History:  {:?}", summary.historical_years);
    println!("   Forecast: {:?}\n", summary.forecast_years);
    println!("   {} revenue:      {:>12.2}m", summary.latest_year, summary.revenue);
    println!("   {} net profit:   {:>12.2}m", summary.latest_year, summary.net_profit);
    println!("   {} total assets: {:>12.2}m", summary.latest_year, summary.total_assets);
    println!("   {} balance check:{:>12.2}m\n", summary.latest_year, summary.balance_check);

    println!("📈 Revenue projection:");
    for year in model.timeline.forecast() {
        let revenue = model.value(Namespace::Revenue, "TOTAL", *year)?;
        let cash = model.value(Namespace::BalanceSheet, "MONETARYFUNDS", *year)?;
        println!("   {}E  revenue {:>10.2}m   closing cash {:>10.2}m", year, revenue, cash);
    }

    println!("\n⚖️  Balancing plug:");
    for plug in &model.plugs {
        println!(
            "   {}{}  {:>10.2}m ({:.2}% of assets)",
            plug.year,
            if plug.is_historical { "A" } else { "E" },
            plug.plug,
            plug.ratio() * 100.0
        );
    }

    if let Some(path) = builder.build_model(&security)? {
        println!("\n💾 Workbook written to {}", path.display());
    }

    let chart = ChartOfAccounts::from_registry(builder.engine().schema());
    std::fs::write("demo_output/chart_of_accounts.md", chart.to_markdown())?;
    println!("📋 Chart of accounts ({} lines) written to demo_output/chart_of_accounts.md", chart.len());

    Ok(())
}
