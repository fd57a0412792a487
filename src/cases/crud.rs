//! CRUD cases for the mercado resource
//!
//! Cases 1, 2, 5, 7 and 13. Case 1 captures the created id; the others act on
//! it, except delete which targets a fixed id unless configured otherwise.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{CaseContext, CaseError};
use crate::context::ContextKey;
use crate::models::{id_segment, mercado_shape, Mercado};
use crate::spec::RequestSpec;

/// Case 1: create a mercado and capture its id
pub async fn create(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    let payload = ctx.payload();

    let outcome = ctx
        .step(
            RequestSpec::post(ctx.collection())
                .with_body(payload.to_json())
                .expect_status(StatusCode::CREATED)
                .returns("mercado.id"),
        )
        .await?;

    let id = outcome
        .extracted
        .ok_or_else(|| CaseError::Assertion("create returned no mercado.id".to_string()))?;

    info!("Created mercado {} ({})", id_segment(&id), payload.nome);
    ctx.provide(ContextKey::MercadoId, id)
}

/// Case 2: fetch the created mercado
pub async fn fetch_by_id(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    let id = ctx.require(ContextKey::MercadoId)?;

    ctx.step(RequestSpec::get(ctx.member(&id)).expect_status(StatusCode::OK))
        .await?;
    Ok(())
}

/// Case 5: replace the created mercado with fresh data
pub async fn update(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    let id = ctx.require(ContextKey::MercadoId)?;

    ctx.step(
        RequestSpec::put(ctx.member(&id))
            .with_body(ctx.payload().to_json())
            .expect_status(StatusCode::OK),
    )
    .await?;
    Ok(())
}

/// Case 7: delete a mercado
pub async fn delete(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    let id = match ctx.settings().delete_id {
        Some(fixed) => {
            // Carried over from the hosted suite: the target is unrelated to
            // the mercado created in case 1
            warn!("Deleting fixed mercado id {} rather than the captured one", fixed);
            Value::from(fixed)
        }
        None => ctx.require(ContextKey::MercadoId)?,
    };

    ctx.step(RequestSpec::delete(ctx.member(&id)).expect_status(StatusCode::OK))
        .await?;
    Ok(())
}

/// Case 13: fetch the created mercado and check every field
pub async fn fetch_details(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    let id = ctx.require(ContextKey::MercadoId)?;

    let outcome = ctx
        .step(
            RequestSpec::get(ctx.member(&id))
                .expect_status(StatusCode::OK)
                .expect_json_like(mercado_shape(Some(&id))),
        )
        .await?;

    if let Some(mercado) = outcome
        .response
        .json
        .and_then(|body| serde_json::from_value::<Mercado>(body).ok())
    {
        debug!("Fetched mercado {}: {} at {}", id_segment(&mercado.id), mercado.nome, mercado.endereco);
    }
    Ok(())
}
