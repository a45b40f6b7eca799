//! Per-document render state.
//!
//! Created fresh for every render, mutated only while the tree is walked and
//! read by the assembler afterwards.

use std::fmt;

use fxhash::FxHashMap;
use indexmap::IndexMap;
use mdlatex_ir::MetaKey;

use crate::options::{RenderOptions, SLIDE_DOC_TYPES};

/// `\usepackage` requirements keyed by package name, in first-registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    packages: IndexMap<String, String>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` unless it is already present.
    pub fn require(&mut self, name: &str, options: &str) {
        if !self.packages.contains_key(name) {
            log::debug!("package requirement: {}", name);
            self.packages.insert(name.to_string(), options.to_string());
        }
    }

    /// Register `name`, replacing any options registered earlier.
    pub fn set(&mut self, name: &str, options: &str) {
        self.packages.insert(name.to_string(), options.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn options(&self, name: &str) -> Option<&str> {
        self.packages.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.packages
            .iter()
            .map(|(name, options)| (name.as_str(), options.as_str()))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, options) in self.iter() {
            if options.is_empty() {
                out.push_str(&format!("\\usepackage{{{}}}\n", name));
            } else {
                out.push_str(&format!("\\usepackage[{}]{{{}}}\n", options, name));
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    DuplicateTitle,
    InvalidH2Level,
}

/// Non-fatal structural problem found while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl RenderWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning: {}", self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub metadata: FxHashMap<MetaKey, String>,
    pub packages: PackageSet,
    /// First top-level heading, already rendered to LaTeX.
    pub title: Option<String>,
    pub abstract_text: String,
    pub abstract_open: bool,
    pub quote_open: bool,
    pub pending_caption: Option<String>,
    pub bibliography_sources: Vec<String>,
    /// Free-form preamble fragments collected from the body.
    pub preamble: String,
    pub slide_mode: bool,
    pub frame_open: bool,
    pub warnings: Vec<RenderWarning>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self, key: MetaKey) -> Option<&str> {
        self.metadata.get(&key).map(String::as_str)
    }

    /// Record a metadata directive; later values overwrite earlier ones.
    pub fn set_metadata(&mut self, key: MetaKey, value: &str) {
        if key == MetaKey::DocType
            && SLIDE_DOC_TYPES
                .iter()
                .any(|ty| ty.eq_ignore_ascii_case(value.trim()))
        {
            if !self.slide_mode {
                log::debug!("document type {} switches to slide mode", value);
            }
            self.slide_mode = true;
        }
        if key == MetaKey::H2Level && value.trim().parse::<i64>().is_err() {
            self.warn(
                WarningKind::InvalidH2Level,
                format!("H2Level `{}` is not an integer; using the default", value),
            );
        }
        self.metadata.insert(key, value.to_string());
    }

    pub fn h2_level(&self, options: &RenderOptions) -> i64 {
        self.metadata(MetaKey::H2Level)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(options.default_h2_level)
    }

    /// Math package in force, or `None` when disabled with `none`.
    pub fn math_package<'a>(&'a self, options: &'a RenderOptions) -> Option<&'a str> {
        let package = self
            .metadata(MetaKey::MathPkg)
            .unwrap_or(options.default_math_package.as_str())
            .trim();
        if package.is_empty() || package.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(package)
        }
    }

    pub fn open_abstract(&mut self) {
        self.abstract_open = true;
        self.abstract_text = "\\begin{abstract}\n".to_string();
    }

    pub fn close_abstract(&mut self) {
        if self.abstract_open {
            self.abstract_open = false;
            self.abstract_text.push_str("\\end{abstract}\n");
        }
    }

    /// Flip the open-quote flag; returns the new state.
    pub fn toggle_quote(&mut self) -> bool {
        self.quote_open = !self.quote_open;
        self.quote_open
    }

    pub fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
        let warning = RenderWarning::new(kind, message);
        log::warn!("{}", warning.message);
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_requirements_converge() {
        let mut packages = PackageSet::new();
        packages.require("biblatex", "style=authoryear-ibid");
        packages.require("biblatex", "");
        packages.require("makeidx", "");
        assert_eq!(packages.len(), 2);
        assert_eq!(packages.options("biblatex"), Some("style=authoryear-ibid"));
    }

    #[test]
    fn explicit_set_overrides_options_in_place() {
        let mut packages = PackageSet::new();
        packages.require("geometry", "");
        packages.require("graphicx", "");
        packages.set("geometry", "margin=1in");
        assert_eq!(
            packages.render(),
            "\\usepackage[margin=1in]{geometry}\n\\usepackage{graphicx}\n"
        );
    }

    #[test]
    fn slide_mode_latches() {
        let mut state = RenderState::new();
        state.set_metadata(MetaKey::DocType, "beamer");
        state.set_metadata(MetaKey::DocType, "article");
        assert!(state.slide_mode);
        assert_eq!(state.metadata(MetaKey::DocType), Some("article"));
    }

    #[test]
    fn quote_toggles() {
        let mut state = RenderState::new();
        assert!(state.toggle_quote());
        assert!(!state.toggle_quote());
        assert!(state.toggle_quote());
    }

    #[test]
    fn bad_h2_level_warns_and_falls_back() {
        let options = RenderOptions::default();
        let mut state = RenderState::new();
        state.set_metadata(MetaKey::H2Level, "two");
        assert_eq!(state.h2_level(&options), 2);
        assert_eq!(state.warnings.len(), 1);
        assert_eq!(state.warnings[0].kind, WarningKind::InvalidH2Level);
        state.set_metadata(MetaKey::H2Level, "1");
        assert_eq!(state.h2_level(&options), 1);
    }

    #[test]
    fn math_package_can_be_disabled() {
        let options = RenderOptions::default();
        let mut state = RenderState::new();
        assert_eq!(state.math_package(&options), Some("amsmath"));
        state.set_metadata(MetaKey::MathPkg, "None");
        assert_eq!(state.math_package(&options), None);
    }
}
