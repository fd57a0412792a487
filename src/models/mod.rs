//! Data models for the mercado suite
//!
//! This module contains the case catalogue, result types and resource shapes.

mod mercado;
mod test_result;

pub use mercado::{
    id_segment, mercado_shape, Mercado, MercadoPayload, CNPJ_DIGITS, MISSING_ID,
};
pub use test_result::{CaseResult, ExpectationResult, MercadoCase, TestStatus};
