//! Prompt templates sent to the generation engine.
//!
//! Both extraction modes share one template shape: an introduction, optional
//! context blocks, numbered rules, the field list of the expected objects, an
//! optional worked example and a closing instruction.

use std::fmt::Write;

use serde_json::Value;

/// One field the model must emit per object.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: &'static str,
    pub description: &'static str,
}

/// Labelled block of input text embedded in the prompt.
#[derive(Debug, Clone)]
pub struct ContextBlock {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub intro: String,
    pub context: Vec<ContextBlock>,
    pub rules: Vec<&'static str>,
    pub fields: &'static [FieldSpec],
    pub example: Option<&'static str>,
    pub closing: &'static str,
}

impl PromptTemplate {
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.intro);
        out.push_str("\n\n");

        for block in &self.context {
            let _ = writeln!(out, "{}:\n{}\n", block.heading, block.body);
        }

        if !self.rules.is_empty() {
            out.push_str("REGLAS ESTRICTAS:\n");
            for (index, rule) in self.rules.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", index + 1, rule);
            }
            out.push('\n');
        }

        out.push_str("Cada objeto del array JSON debe tener estos campos:\n");
        for field in self.fields {
            let _ = writeln!(out, "- {} ({}): {}", field.name, field.kind, field.description);
        }
        out.push('\n');

        if let Some(example) = self.example {
            let _ = writeln!(out, "EJEMPLO:\n{example}\n");
        }

        out.push_str(self.closing);
        out
    }
}

pub const DOCUMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "nombre",
        kind: "string",
        description: "nombre del producto",
    },
    FieldSpec {
        name: "precioVenta",
        kind: "number",
        description: "precio de venta, solo si se menciona",
    },
    FieldSpec {
        name: "precioCosto",
        kind: "number",
        description: "precio de costo, solo si se menciona",
    },
    FieldSpec {
        name: "stock",
        kind: "number",
        description: "cantidad disponible, solo si se menciona",
    },
    FieldSpec {
        name: "codigoBarras",
        kind: "string",
        description: "código de barras, solo si se menciona",
    },
];

pub const VOICE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "id",
        kind: "number",
        description: "ID del producto en la base de datos",
    },
    FieldSpec {
        name: "nombre",
        kind: "string",
        description: "nombre EXACTO del producto en la base de datos",
    },
    FieldSpec {
        name: "cantidad",
        kind: "number",
        description: "cantidad pedida, entero positivo",
    },
    FieldSpec {
        name: "precioVenta",
        kind: "number",
        description: "precio de venta del producto en la base de datos",
    },
    FieldSpec {
        name: "precioCosto",
        kind: "number",
        description: "precio de costo del producto en la base de datos",
    },
];

const VOICE_EXAMPLE: &str = r#"[{"id": 25, "nombre": "Cachafaz conitos", "cantidad": 2, "precioVenta": 500, "precioCosto": 300}]"#;

const CLOSING: &str = "RESPONDE SOLO CON EL ARRAY JSON, SIN EXPLICACIONES NI COMENTARIOS.";

pub fn document_prompt(raw_text: &str) -> String {
    PromptTemplate {
        intro: "Analiza el siguiente texto y extrae los productos mencionados. \
                Devuelve SOLO un array JSON con los productos encontrados."
            .to_string(),
        context: vec![ContextBlock {
            heading: "Texto a analizar".to_string(),
            body: raw_text.to_string(),
        }],
        rules: vec![
            "Devuelve SOLO un array JSON válido",
            "Omite los campos que no se mencionan en el texto",
            "Si no encuentras productos, devuelve un array vacío []",
        ],
        fields: DOCUMENT_FIELDS,
        example: None,
        closing: CLOSING,
    }
    .render()
}

pub fn voice_prompt(transcript: &str, catalog: &[Value]) -> String {
    let catalog_json =
        serde_json::to_string_pretty(catalog).unwrap_or_else(|_| "[]".to_string());

    PromptTemplate {
        intro: format!(
            "Eres un asistente de ventas inteligente especializado en interpretación de pedidos. \
             El cliente dijo: \"{transcript}\""
        ),
        context: vec![ContextBlock {
            heading: "BASE DE DATOS DE PRODUCTOS DISPONIBLES".to_string(),
            body: catalog_json,
        }],
        rules: vec![
            "SOLO devuelve productos que existan EXACTAMENTE en la base de datos",
            "Busca coincidencias exactas o muy similares en los nombres",
            "Extrae las cantidades mencionadas explícitamente",
            "Si no se menciona cantidad, asume 1",
            "Si no encuentras productos que coincidan, devuelve array vacío []",
            "NO inventes productos que no estén en la base de datos",
        ],
        fields: VOICE_FIELDS,
        example: Some(VOICE_EXAMPLE),
        closing: CLOSING,
    }
    .render()
}
