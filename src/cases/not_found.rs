//! Not-found cases
//!
//! Cases 6, 8 and 9 address an id that must not exist.

use reqwest::StatusCode;

use super::{CaseContext, CaseError};
use crate::spec::RequestSpec;

pub async fn fetch_missing(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    ctx.step(RequestSpec::get(ctx.missing_member()).expect_status(StatusCode::NOT_FOUND))
        .await?;
    Ok(())
}

pub async fn delete_missing(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    ctx.step(RequestSpec::delete(ctx.missing_member()).expect_status(StatusCode::NOT_FOUND))
        .await?;
    Ok(())
}

/// Update needs a valid body so the 404 is not masked by a 400
pub async fn update_missing(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    ctx.step(
        RequestSpec::put(ctx.missing_member())
            .with_body(ctx.payload().to_json())
            .expect_status(StatusCode::NOT_FOUND),
    )
    .await?;
    Ok(())
}
