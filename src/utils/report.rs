//! Machine-readable summary of a rendered document.

use mdlatex_ir::Loss as IrLoss;
use serde::Serialize;

use crate::pipeline::Conversion;
use crate::utils::error::ConversionResult;

#[derive(Debug, Clone, Serialize)]
pub struct LossRecord {
    pub id: String,
    pub kind: String,
    pub message: String,
}

impl LossRecord {
    pub fn from_ir_loss(id: String, loss: &IrLoss) -> Self {
        Self {
            id,
            kind: loss.kind.clone(),
            message: loss.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub input: String,
    /// Written `.tex` file; `None` when the output went to stdout.
    pub output: Option<String>,
    pub title: String,
    pub author: String,
    pub date: String,
    pub doc_type: String,
    pub slides: bool,
    pub packages: Vec<String>,
    pub bibliography_sources: Vec<String>,
    pub warnings: Vec<String>,
    pub losses: Vec<LossRecord>,
}

impl RenderReport {
    pub fn new(input: impl Into<String>, output: Option<String>, conversion: &Conversion) -> Self {
        let summary = &conversion.summary;
        let losses = conversion
            .losses
            .iter()
            .enumerate()
            .map(|(idx, loss)| LossRecord::from_ir_loss(format!("L{:04}", idx + 1), loss))
            .collect();
        Self {
            input: input.into(),
            output,
            title: summary.title.clone(),
            author: summary.author.clone(),
            date: summary.date.clone(),
            doc_type: summary.doc_type.clone(),
            slides: summary.slides,
            packages: summary.packages.clone(),
            bibliography_sources: summary.bibliography_sources.clone(),
            warnings: conversion
                .warnings
                .iter()
                .map(|warning| warning.message.clone())
                .collect(),
            losses,
        }
    }
}

/// Pretty JSON for one or more reports.
pub fn reports_to_json(reports: &[RenderReport]) -> ConversionResult<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}
