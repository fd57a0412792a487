//! Fake data for request bodies
//!
//! Plausible random company names, street addresses and numeric strings.
//! Every function is pure apart from the RNG it is handed.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::models::{MercadoPayload, CNPJ_DIGITS};

const NAME_PREFIXES: &[&str] = &[
    "Mercado", "Supermercado", "Empório", "Armazém", "Mercearia", "Hortifruti", "Atacadão",
    "Quitanda",
];

const NAME_CORES: &[&str] = &[
    "Silva", "Souza", "Oliveira", "Pereira", "Costa", "Almeida", "Ribeiro", "Carvalho", "Gomes",
    "Martins", "Araújo", "Barbosa",
];

const NAME_SUFFIXES: &[&str] = &["Ltda", "S.A.", "e Filhos", "EIRELI", "Comércio", "& Cia"];

const STREET_TYPES: &[&str] = &["Rua", "Avenida", "Travessa", "Alameda", "Praça", "Rodovia"];

const STREET_NAMES: &[&str] = &[
    "das Flores", "Sete de Setembro", "XV de Novembro", "Santos Dumont", "Getúlio Vargas",
    "Tiradentes", "da Liberdade", "Dom Pedro II", "Marechal Deodoro", "Brasil",
];

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// A company-like name, e.g. "Mercado Silva Ltda"
pub fn company_name(rng: &mut impl Rng) -> String {
    format!(
        "{} {} {}",
        pick(rng, NAME_PREFIXES),
        pick(rng, NAME_CORES),
        pick(rng, NAME_SUFFIXES)
    )
}

/// A street address, e.g. "Rua das Flores, 123"
pub fn street_address(rng: &mut impl Rng) -> String {
    format!(
        "{} {}, {}",
        pick(rng, STREET_TYPES),
        pick(rng, STREET_NAMES),
        rng.random_range(1..=9999_u32)
    )
}

/// A string of exactly `len` decimal digits, first digit non-zero
pub fn digits(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|i| {
            let low = if i == 0 { 1 } else { 0 };
            char::from(b'0' + rng.random_range(low..10_u8))
        })
        .collect()
}

/// A well-formed 14-digit CNPJ
pub fn cnpj(rng: &mut impl Rng) -> String {
    digits(rng, CNPJ_DIGITS)
}

/// A valid create/update body
pub fn mercado_payload(rng: &mut impl Rng) -> MercadoPayload {
    MercadoPayload {
        cnpj: cnpj(rng),
        endereco: street_address(rng),
        nome: company_name(rng),
    }
}
