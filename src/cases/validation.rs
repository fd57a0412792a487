//! Validation cases
//!
//! Cases 3 and 11: malformed bodies are rejected with 400.

use reqwest::StatusCode;

use super::{CaseContext, CaseError};
use crate::fake;
use crate::models::CNPJ_DIGITS;
use crate::spec::RequestSpec;

/// Case 3: a CNPJ one digit short
pub async fn reject_short_cnpj(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    let short = fake::digits(&mut rand::rng(), CNPJ_DIGITS - 1);
    let payload = ctx.payload().with_cnpj(short);

    ctx.step(
        RequestSpec::post(ctx.collection())
            .with_body(payload.to_json())
            .expect_status(StatusCode::BAD_REQUEST),
    )
    .await?;
    Ok(())
}

/// Case 11: an empty name
pub async fn reject_empty_name(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    let payload = ctx.payload().with_nome("");

    ctx.step(
        RequestSpec::post(ctx.collection())
            .with_body(payload.to_json())
            .expect_status(StatusCode::BAD_REQUEST),
    )
    .await?;
    Ok(())
}
