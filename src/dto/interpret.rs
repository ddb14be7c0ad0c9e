use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::{CatalogEntry, VoiceProduct};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InterpretVoiceRequest {
    #[serde(default)]
    pub texto: String,
    #[serde(default)]
    #[schema(value_type = Vec<CatalogEntry>)]
    pub productos: Vec<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterpretVoiceResponse {
    #[schema(value_type = Vec<VoiceProduct>)]
    pub productos: Vec<Value>,
    pub texto_original: String,
}
