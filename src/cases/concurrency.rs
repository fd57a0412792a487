//! Concurrency case
//!
//! Case 12: fan out N creates, then confirm each produced a distinct mercado
//! and that the list grew past N.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::info;

use super::{CaseContext, CaseError};
use crate::context::ContextKey;
use crate::matcher::{render_scalar, Mismatch};
use crate::spec::RequestSpec;

pub async fn create_many_and_count(ctx: &CaseContext<'_>) -> Result<(), CaseError> {
    let n = ctx.settings().fan_out;

    let specs = (0..n)
        .map(|_| {
            RequestSpec::post(ctx.collection())
                .with_body(ctx.payload().to_json())
                .expect_status(StatusCode::CREATED)
                .returns("mercado.id")
        })
        .collect();

    let outcomes = ctx.fan_out(specs).await?;
    let ids: Vec<Value> = outcomes.into_iter().filter_map(|o| o.extracted).collect();
    info!("Created {} mercados concurrently", ids.len());

    let mut distinct: Vec<&Value> = Vec::new();
    for id in &ids {
        if !distinct.contains(&id) {
            distinct.push(id);
        }
    }
    ctx.check(
        format!("{n} concurrent creates yield {n} distinct ids"),
        distinct.len() == n,
        (distinct.len() != n).then(|| Mismatch {
            field: "mercado.id".to_string(),
            expected: format!("{n} distinct ids"),
            actual: format!("{} distinct", distinct.len()),
        }),
    )?;

    // Only comparable when case 1 ran in this suite
    let captured = ctx.require(ContextKey::MercadoId).ok();
    let reused = captured
        .as_ref()
        .filter(|captured| ids.contains(captured));
    ctx.check(
        "concurrent creates do not reuse the captured id",
        reused.is_none(),
        reused.map(|id| Mismatch {
            field: "mercado.id".to_string(),
            expected: "an id other than the captured one".to_string(),
            actual: render_scalar(id),
        }),
    )?;

    ctx.step(
        RequestSpec::get(ctx.collection())
            .expect_status(StatusCode::OK)
            .expect_length_greater_than(n),
    )
    .await?;
    Ok(())
}
