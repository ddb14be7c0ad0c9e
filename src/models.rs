use serde::{Deserialize, Serialize};
use serde_json::Number;
use utoipa::ToSchema;

/// Product record proposed by the model for an uploaded document.
///
/// Only documents the shape: document-mode replies are returned as the model wrote them.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProduct {
    pub nombre: String,
    #[schema(value_type = Option<f64>)]
    pub precio_venta: Option<Number>,
    #[schema(value_type = Option<f64>)]
    pub precio_costo: Option<Number>,
    #[schema(value_type = Option<f64>)]
    pub stock: Option<Number>,
    pub codigo_barras: Option<String>,
}

/// Catalog product matched from a spoken order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProduct {
    pub id: i64,
    pub nombre: String,
    pub cantidad: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub precio_venta: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub precio_costo: Option<Number>,
}

/// Product owned by the caller, sent along with a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: i64,
    pub nombre: String,
    #[schema(value_type = Option<f64>)]
    pub precio_venta: Option<Number>,
    #[schema(value_type = Option<f64>)]
    pub precio_costo: Option<Number>,
}
