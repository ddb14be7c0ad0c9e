//! Reconciles voice-mode candidates against the caller's catalog.

use std::{collections::HashMap, fmt};

use clap::ValueEnum;
use serde_json::{Number, Value};

use crate::models::{CatalogEntry, VoiceProduct};

/// What to do with candidates that do not match the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogPolicy {
    /// Return the model's reply unchanged.
    Trust,
    /// Keep matching candidates, drop the rest.
    Drop,
    /// Fail the whole request on the first mismatch.
    Reject,
}

impl fmt::Display for CatalogPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogPolicy::Trust => write!(f, "trust"),
            CatalogPolicy::Drop => write!(f, "drop"),
            CatalogPolicy::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    NotAnObject { index: usize },
    UnknownProduct { index: usize, id: Value },
    InvalidQuantity { index: usize, quantity: Value },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NotAnObject { index } => write!(f, "item {index} is not an object"),
            Violation::UnknownProduct { index, id } => {
                write!(f, "item {index} references unknown product id {id}")
            }
            Violation::InvalidQuantity { index, quantity } => {
                write!(f, "item {index} has invalid quantity {quantity}")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    entries: HashMap<i64, CatalogEntry>,
    skipped: usize,
    duplicates: usize,
}

impl Catalog {
    /// Builds a lookup from the raw catalog; entries without a usable id or name are skipped
    /// and a repeated id keeps its last entry.
    pub fn from_values(values: &[Value]) -> Self {
        let mut entries = HashMap::with_capacity(values.len());
        let mut skipped = 0usize;
        let mut duplicates = 0usize;
        for value in values {
            let Some(id) = value.get("id").and_then(as_integer) else {
                skipped += 1;
                continue;
            };
            let Some(nombre) = value.get("nombre").and_then(Value::as_str) else {
                skipped += 1;
                continue;
            };
            let previous = entries.insert(
                id,
                CatalogEntry {
                    id,
                    nombre: nombre.to_string(),
                    precio_venta: value.get("precioVenta").and_then(as_number),
                    precio_costo: value.get("precioCosto").and_then(as_number),
                },
            );
            if previous.is_some() {
                duplicates += 1;
                tracing::debug!(id, "duplicate catalog id; the later entry wins");
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, "catalog entries without usable id or name");
        }
        if duplicates > 0 {
            tracing::warn!(duplicates, "catalog contains repeated ids");
        }
        Self {
            entries,
            skipped,
            duplicates,
        }
    }

    pub fn get(&self, id: i64) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }

    /// Entries dropped for lacking a usable id or name.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Entries that repeated an id already seen.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Applies `policy` to the model's candidates.
///
/// Accepted candidates take their name and prices from the catalog entry.
pub fn reconcile(
    candidates: Vec<Value>,
    catalog: &Catalog,
    policy: CatalogPolicy,
) -> Result<Vec<Value>, Vec<Violation>> {
    if policy == CatalogPolicy::Trust {
        return Ok(candidates);
    }

    let mut accepted = Vec::with_capacity(candidates.len());
    let mut violations = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        match match_candidate(index, candidate, catalog) {
            Ok(product) => accepted.push(product),
            Err(violation) => violations.push(violation),
        }
    }

    if policy == CatalogPolicy::Reject && !violations.is_empty() {
        return Err(violations);
    }

    for violation in &violations {
        tracing::warn!(%violation, "dropping voice candidate");
    }

    Ok(accepted
        .into_iter()
        .filter_map(|product| serde_json::to_value(product).ok())
        .collect())
}

fn match_candidate(
    index: usize,
    candidate: &Value,
    catalog: &Catalog,
) -> Result<VoiceProduct, Violation> {
    let object = candidate
        .as_object()
        .ok_or(Violation::NotAnObject { index })?;

    let raw_id = object.get("id").cloned().unwrap_or(Value::Null);
    let entry = as_integer(&raw_id)
        .and_then(|id| catalog.get(id))
        .ok_or_else(|| Violation::UnknownProduct {
            index,
            id: raw_id.clone(),
        })?;

    let cantidad = match object.get("cantidad") {
        None | Some(Value::Null) => 1,
        Some(raw) => as_integer(raw)
            .filter(|quantity| *quantity > 0)
            .map(|quantity| quantity as u64)
            .ok_or_else(|| Violation::InvalidQuantity {
                index,
                quantity: raw.clone(),
            })?,
    };

    Ok(VoiceProduct {
        id: entry.id,
        nombre: entry.nombre.clone(),
        cantidad,
        precio_venta: entry.precio_venta.clone(),
        precio_costo: entry.precio_costo.clone(),
    })
}

/// Integers, integral floats and numeric strings.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(number) => Some(number.clone()),
        Value::String(text) => text.trim().parse::<Number>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::from_values(&[
            json!({"id": 25, "nombre": "Cachafaz conitos", "precioVenta": 500, "precioCosto": 300}),
            json!({"id": "7", "nombre": "Coca Cola 500ml", "precioVenta": 800.5}),
            json!({"nombre": "sin id"}),
        ])
    }

    #[test]
    fn catalog_skips_entries_without_id() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.skipped(), 1);
        assert_eq!(catalog.duplicates(), 0);
        assert_eq!(catalog.get(7).unwrap().nombre, "Coca Cola 500ml");
    }

    #[test]
    fn repeated_ids_are_counted_apart_from_skipped_entries() {
        let catalog = Catalog::from_values(&[
            json!({"id": 25, "nombre": "Cachafaz conitos"}),
            json!({"id": 25, "nombre": "Cachafaz conitos x6"}),
            json!({"id": 26}),
            json!({"nombre": "sin id"}),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skipped(), 2);
        assert_eq!(catalog.duplicates(), 1);
        assert_eq!(catalog.get(25).unwrap().nombre, "Cachafaz conitos x6");
    }

    #[test]
    fn trust_returns_candidates_untouched() {
        let candidates = vec![json!({"id": 999, "nombre": "Inventado"})];
        let result = reconcile(candidates.clone(), &catalog(), CatalogPolicy::Trust).unwrap();
        assert_eq!(result, candidates);
    }

    #[test]
    fn drop_normalizes_matches_from_catalog() {
        let candidates = vec![json!({"id": 25, "nombre": "cachafaz", "cantidad": 2})];
        let result = reconcile(candidates, &catalog(), CatalogPolicy::Drop).unwrap();
        assert_eq!(
            result,
            vec![json!({
                "id": 25,
                "nombre": "Cachafaz conitos",
                "cantidad": 2,
                "precioVenta": 500,
                "precioCosto": 300
            })]
        );
    }

    #[test]
    fn missing_quantity_defaults_to_one() {
        let candidates = vec![json!({"id": "7"})];
        let result = reconcile(candidates, &catalog(), CatalogPolicy::Drop).unwrap();
        assert_eq!(result[0]["cantidad"], json!(1));
        assert_eq!(result[0]["precioVenta"], json!(800.5));
        assert!(result[0].get("precioCosto").is_none());
    }

    #[test]
    fn drop_discards_unknown_ids_and_bad_quantities() {
        let candidates = vec![
            json!({"id": 999, "nombre": "Inventado", "cantidad": 1}),
            json!({"id": 25, "cantidad": 0}),
            json!({"id": 25, "cantidad": 1.5}),
            json!("Cachafaz"),
            json!({"id": 25, "cantidad": 3.0}),
        ];
        let result = reconcile(candidates, &catalog(), CatalogPolicy::Drop).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["cantidad"], json!(3));
    }

    #[test]
    fn reject_reports_every_violation() {
        let candidates = vec![
            json!({"id": 25, "cantidad": -2}),
            json!({"id": 25, "cantidad": 1}),
            json!({"id": null}),
        ];
        let violations = reconcile(candidates, &catalog(), CatalogPolicy::Reject).unwrap_err();
        assert_eq!(
            violations,
            vec![
                Violation::InvalidQuantity {
                    index: 0,
                    quantity: json!(-2)
                },
                Violation::UnknownProduct {
                    index: 2,
                    id: Value::Null
                },
            ]
        );
    }

    #[test]
    fn empty_catalog_matches_nothing() {
        let empty = Catalog::from_values(&[]);
        assert!(empty.is_empty());
        let result = reconcile(vec![json!({"id": 25})], &empty, CatalogPolicy::Drop).unwrap();
        assert!(result.is_empty());
    }
}
