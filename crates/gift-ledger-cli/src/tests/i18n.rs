// crates/gift-ledger-cli/src/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Unit tests for catalog integrity.
// Purpose: Ensure catalog keys are unique and templates are well formed.
// Dependencies: gift-ledger-cli i18n module
// ============================================================================

//! ## Overview
//! Verifies the CLI message catalog has unique keys and that every template
//! uses well-formed `{placeholder}` names.

use std::collections::BTreeSet;

use crate::i18n::CATALOG_ITEMS;
use crate::i18n::MessageArg;
use crate::i18n::translate;

fn parse_placeholder_names(template: &str) -> Result<BTreeSet<String>, String> {
    let mut placeholders = BTreeSet::new();
    let mut rest = template;
    while let Some(start) = rest.find(['{', '}']) {
        if rest[start ..].starts_with('}') {
            return Err(format!("unmatched '}}' in {template}"));
        }
        let after = &rest[start + 1 ..];
        let Some(end) = after.find('}') else {
            return Err(format!("unclosed '{{' in {template}"));
        };
        let name = &after[.. end];
        if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_lowercase() || ch == '_') {
            return Err(format!("placeholder '{name}' in {template} must use [a-z_]"));
        }
        placeholders.insert(name.to_string());
        rest = &after[end + 1 ..];
    }
    Ok(placeholders)
}

#[test]
fn catalog_keys_are_unique() {
    let keys: BTreeSet<&str> = CATALOG_ITEMS.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys.len(), CATALOG_ITEMS.len());
}

#[test]
fn catalog_templates_have_well_formed_placeholders() {
    for (key, template) in CATALOG_ITEMS {
        if let Err(error) = parse_placeholder_names(template) {
            panic!("catalog entry {key}: {error}");
        }
    }
}

#[test]
fn translate_substitutes_every_placeholder() {
    for (key, template) in CATALOG_ITEMS {
        let names = parse_placeholder_names(template).unwrap();
        let args: Vec<MessageArg> =
            names.iter().map(|name| MessageArg::new(leak(name), "x")).collect();
        let rendered = translate(key, args);
        for name in &names {
            assert!(!rendered.contains(&format!("{{{name}}}")), "{key} left {name} unsubstituted");
        }
    }
}

#[test]
fn sqlite_required_names_the_command() {
    let rendered = translate("store.sqlite_required", vec![MessageArg::new("command", "migrate")]);
    assert!(rendered.starts_with("The migrate command requires a sqlite store"));
}

fn leak(name: &str) -> &'static str {
    Box::leak(name.to_string().into_boxed_str())
}
