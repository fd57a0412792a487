//! Mercado resource models
//!
//! Shapes of the resource consumed from the remote API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::matcher::{Matcher, Shape};

/// Number of digits a valid CNPJ carries
pub const CNPJ_DIGITS: usize = 14;

/// Id used for lookups that must miss
pub const MISSING_ID: u64 = 99999;

/// Request body for create and update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MercadoPayload {
    pub cnpj: String,
    pub endereco: String,
    pub nome: String,
}

impl MercadoPayload {
    pub fn with_cnpj(mut self, cnpj: impl Into<String>) -> Self {
        self.cnpj = cnpj.into();
        self
    }

    pub fn with_nome(mut self, nome: impl Into<String>) -> Self {
        self.nome = nome.into();
        self
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "cnpj": self.cnpj,
            "endereco": self.endereco,
            "nome": self.nome,
        })
    }
}

/// A stored mercado as returned by the API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mercado {
    pub id: Value,
    pub nome: String,
    pub endereco: String,
    pub cnpj: String,
}

/// Shape every listed or fetched mercado must have. `id` is matched exactly
/// when known.
pub fn mercado_shape(id: Option<&Value>) -> Shape {
    let id_matcher = match id {
        Some(id) => Matcher::Exact(id.clone()),
        None => any_text(),
    };
    Shape::new()
        .field("id", id_matcher)
        .field("nome", any_text())
        .field("endereco", any_text())
        .field("cnpj", any_text())
}

fn any_text() -> Matcher {
    Matcher::Pattern(regex::Regex::new(".*").expect("static pattern"))
}

/// Render an id for use as a path segment
pub fn id_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
