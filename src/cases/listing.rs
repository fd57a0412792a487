//! Listing cases
//!
//! Cases 4 and 10.

use reqwest::StatusCode;

use super::{CaseContext, CaseError};
use crate::matcher::ArrayMode;
use crate::models::mercado_shape;
use crate::spec::RequestSpec;

/// Case 4: the list holds at least one well-formed mercado
pub async fn list(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    ctx.step(
        RequestSpec::get(ctx.collection())
            .expect_status(StatusCode::OK)
            .expect_json_array(mercado_shape(None), ArrayMode::Some),
    )
    .await?;
    Ok(())
}

/// Case 10: every listed mercado is well-formed
///
/// Stricter than case 4: a single stored row missing a field fails this case
/// while case 4 still passes.
pub async fn validate_list_shape(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    ctx.step(
        RequestSpec::get(ctx.collection())
            .expect_status(StatusCode::OK)
            .expect_json_array(mercado_shape(None), ArrayMode::Every),
    )
    .await?;
    Ok(())
}
