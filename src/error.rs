use crate::reference::Namespace;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Reference {namespace}:{key} was already recorded")]
    DuplicateReference { namespace: Namespace, key: String },

    #[error("Missing reference {namespace}:{key} (looked up before it was recorded)")]
    MissingReference { namespace: Namespace, key: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Accounting equation violation in {year}: Assets ({assets}) != Liabilities + Equity ({liabilities_and_equity}), difference {difference}")]
    AccountingEquationViolation {
        year: i32,
        assets: f64,
        liabilities_and_equity: f64,
        difference: f64,
    },

    #[error("Evaluation error at '{sheet}'!{cell}: {details}")]
    Evaluation {
        sheet: String,
        cell: String,
        details: String,
    },

    #[error("No usable fiscal years for {0}")]
    NoData(String),

    #[error("Statement source error: {0}")]
    Source(String),

    #[error("Spreadsheet writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
