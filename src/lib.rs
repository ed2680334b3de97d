//! # Financial Model Builder
//!
//! Turns raw annual statements of a listed company into a formula-driven
//! three-statement forecast workbook.
//!
//! ## Pipeline
//!
//! - **Normalization**: raw provider rows are keyed by canonical line item and
//!   fiscal year ([`Normalizer`], [`DataPool`])
//! - **History**: the retained years are laid out as values, in millions
//! - **Assumptions**: historical ratios, day counts and growth rates as
//!   formulas, with forecast defaults averaged from the last two years
//! - **Schedules**: revenue build-up, capex/PPE roll-forward, debt and
//!   working capital
//! - **Statements**: income statement, balance sheet and cash-flow statement,
//!   each line driven by the schema
//! - **Reconciliation**: a plug row forces `Assets = Liabilities + Equity` in
//!   every period; large plugs are logged
//!
//! Every sheet only references coordinates recorded by earlier stages in the
//! [`ReferenceMap`]. The result is rendered to `.xlsx` with `rust_xlsxwriter`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_model_builder::*;
//!
//! let source = JsonStatementSource::new("data/statements");
//! let builder = ModelBuilder::new(source, ModelConfig::default())?;
//!
//! match builder.build_model(&SecurityId::new("000895"))? {
//!     Some(path) => println!("Model written to {}", path.display()),
//!     None => println!("No data for this security"),
//! }
//! ```

pub mod assumptions;
pub mod balancer;
pub mod chart_of_accounts;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod forecast;
pub mod history;
pub mod ingestion;
pub mod normalizer;
pub mod overrides;
pub mod reference;
pub mod schema;
pub mod utils;
pub mod workbook;
pub mod writer;

pub use balancer::{plug_diagnostics, verify_accounting_equation, AccountingBalancer, PlugDiagnostic};
pub use chart_of_accounts::{AccountEntry, ChartOfAccounts};
pub use config::{FinancingMode, HistoricalAddBack, ModelConfig, RevenueSegment};
pub use engine::{FinancialModel, ModelBuilder, ModelEngine, ModelSummary};
pub use error::{ModelError, Result};
pub use evaluate::{Evaluated, Evaluator};
pub use ingestion::*;
pub use normalizer::{DataPool, Normalizer, PeriodRecord};
pub use overrides::*;
pub use reference::{CellRef, Namespace, ReferenceMap};
pub use schema::*;
pub use utils::{Period, Timeline};
pub use workbook::{CellStyle, CellValue, ModelWorkbook, Sheet};
pub use writer::{save_workbook, workbook_to_buffer};

use std::path::PathBuf;

/// Builds and saves the model for `security_id` with the standard schema.
///
/// Returns `Ok(None)` when the source has no usable fiscal years for it.
pub fn build_model<S: StatementSource>(
    source: S,
    config: ModelConfig,
    security_id: &SecurityId,
) -> Result<Option<PathBuf>> {
    ModelBuilder::new(source, config)?.build_model(security_id)
}

/// Same as [`build_model`], but also fails if any period of the recalculated
/// model violates the accounting equation by more than `tolerance`.
pub fn build_model_with_verification<S: StatementSource>(
    source: S,
    config: ModelConfig,
    security_id: &SecurityId,
    tolerance: f64,
) -> Result<Option<FinancialModel>> {
    let builder = ModelBuilder::new(source, config)?;
    let Some(model) = builder.build(security_id)? else {
        return Ok(None);
    };
    verify_accounting_equation(&model, tolerance)?;
    Ok(Some(model))
}
