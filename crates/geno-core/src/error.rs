//! Top-level error type for geno.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::cypher::CompileError;
use crate::import::ImportError;
use crate::input::GraphInputError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum GenoError {
    #[error("Constraint catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Graph input error: {0}")]
    Input(#[from] GraphInputError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenoError>;
