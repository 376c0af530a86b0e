//! Reference resolution
//!
//! Profiles, permission sets and validation formulas refer to fields by
//! whatever the model wrote: a label, a name, or an API name in any case.
//! The resolver maps every such reference onto the canonical API name of the
//! matching field, and never fails: a reference that matches nothing is
//! turned into an identifier directly.
//!
//! Resolution order for a single reference, first match wins:
//!
//! 1. case-insensitive match against a field's label
//! 2. case-insensitive match against a field's name
//! 3. case-insensitive match against a field's API name, with or without
//!    the `__c` suffix on either side
//! 4. fallback: `normalize(reference)`

use metaforge_core::{CanonicalId, normalize, naming::with_suffix};
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;

use crate::field::FieldSpec;
use crate::lookup::NameLookup;

// ============================================================================
// Diagnostics
// ============================================================================

/// How a reference was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Label,
    Name,
    ApiName,
    /// Whole-word substitution inside a formula
    Formula,
    /// Nothing matched; the id was derived from the reference text
    Fallback,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchKind::Label => "label",
            MatchKind::Name => "name",
            MatchKind::ApiName => "api name",
            MatchKind::Formula => "formula",
            MatchKind::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// One reference mapping made during normalization, kept for auditing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceMapping {
    /// Where the reference appeared (e.g. `profile 'Standard User'`)
    pub context: String,
    /// Reference text as written
    pub reference: String,
    /// Resolved identifier
    pub resolved: CanonicalId,
    pub kind: MatchKind,
}

impl fmt::Display for ReferenceMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: '{}' -> '{}' ({})",
            self.context, self.reference, self.resolved, self.kind
        )
    }
}

// ============================================================================
// Single-reference resolution
// ============================================================================

/// Resolve a field reference against a field list. Never fails.
pub fn resolve(reference: &str, fields: &[FieldSpec]) -> CanonicalId {
    let (id, kind) = resolve_with_kind(reference, fields);
    tracing::debug!(reference, resolved = %id, kind = %kind, "resolved field reference");
    id
}

/// Resolve a field reference and report which rule matched
pub fn resolve_with_kind(reference: &str, fields: &[FieldSpec]) -> (CanonicalId, MatchKind) {
    let wanted = reference.to_lowercase();

    if let Some(field) = fields.iter().find(|f| {
        f.authored_label()
            .is_some_and(|label| label.to_lowercase() == wanted)
    }) {
        return (field.api_name(), MatchKind::Label);
    }

    if let Some(field) = fields
        .iter()
        .find(|f| f.effective_name().to_lowercase() == wanted)
    {
        return (field.api_name(), MatchKind::Name);
    }

    // API-name drift either way: a suffixed reference to a bare field name,
    // or a bare reference to a field authored with its suffix.
    let derived = normalize(reference).as_str().to_lowercase();
    if let Some(field) = fields.iter().find(|f| {
        with_suffix(f.effective_name()).to_lowercase() == wanted
            || f.api_name().as_str().to_lowercase() == derived
    }) {
        return (field.api_name(), MatchKind::ApiName);
    }

    (normalize(reference), MatchKind::Fallback)
}

// ============================================================================
// Resolver
// ============================================================================

/// Schema-scoped resolver that records every mapping it makes
#[derive(Debug)]
pub struct Resolver<'a> {
    object_name: &'a str,
    object_id: CanonicalId,
    fields: &'a [FieldSpec],
    lookup: NameLookup,
    formula_pattern: Option<Regex>,
    mappings: Vec<ReferenceMapping>,
}

impl<'a> Resolver<'a> {
    /// Build a resolver for one object and its fields
    pub fn new(object_name: &'a str, fields: &'a [FieldSpec]) -> Self {
        let lookup = NameLookup::from_fields(fields);
        let formula_pattern = build_formula_pattern(&lookup);

        Self {
            object_name,
            object_id: normalize(object_name),
            fields,
            lookup,
            formula_pattern,
            mappings: Vec::new(),
        }
    }

    /// Canonical API name of the schema object
    pub fn object_id(&self) -> &CanonicalId {
        &self.object_id
    }

    /// The name lookup built from the fields
    pub fn lookup(&self) -> &NameLookup {
        &self.lookup
    }

    /// Resolve a field reference, recording the mapping under `context`
    pub fn resolve_field(&mut self, context: &str, reference: &str) -> CanonicalId {
        let (id, kind) = resolve_with_kind(reference, self.fields);
        self.record(context, reference, &id, kind);
        id
    }

    /// Resolve an object reference.
    ///
    /// Matches the schema object by name or API name (case-insensitive);
    /// anything else is normalized as-is. `None` or a blank reference means
    /// the schema object.
    pub fn resolve_object(&mut self, context: &str, reference: Option<&str>) -> CanonicalId {
        let Some(reference) = reference.filter(|r| !r.trim().is_empty()) else {
            return self.object_id.clone();
        };

        let wanted = reference.to_lowercase();
        let (id, kind) = if wanted == self.object_name.to_lowercase() {
            (self.object_id.clone(), MatchKind::Name)
        } else if wanted == self.object_id.as_str().to_lowercase() {
            (self.object_id.clone(), MatchKind::ApiName)
        } else {
            (normalize(reference), MatchKind::Fallback)
        };

        self.record(context, reference, &id, kind);
        id
    }

    /// Resolve an `Object.Field` permission path into `(object, field)`.
    ///
    /// The path is split at the first `.`; a path without one names a field
    /// on the schema object.
    pub fn resolve_field_path(&mut self, context: &str, path: &str) -> (CanonicalId, CanonicalId) {
        match path.split_once('.') {
            Some((object, field)) => {
                let object = self.resolve_object(context, Some(object));
                let field = self.resolve_field(context, field);
                (object, field)
            }
            None => {
                let field = self.resolve_field(context, path);
                (self.object_id.clone(), field)
            }
        }
    }

    /// Rewrite every whole-word occurrence of a known field name or label
    /// in a formula with its API name.
    ///
    /// All candidates are matched in a single left-to-right pass, longest
    /// key first, so substituted text is never rescanned. The scan is not
    /// formula-aware: a label inside a string literal is replaced too.
    pub fn rewrite_formula(&mut self, context: &str, formula: &str) -> String {
        let Some(pattern) = &self.formula_pattern else {
            return formula.to_string();
        };

        let mut hits: Vec<(String, CanonicalId)> = Vec::new();
        let rewritten = pattern.replace_all(formula, |caps: &Captures<'_>| {
            let key = &caps[0];
            match self.lookup.get(key) {
                Some(id) => {
                    if !hits.iter().any(|(k, _)| k == key) {
                        hits.push((key.to_string(), id.clone()));
                    }
                    id.to_string()
                }
                None => key.to_string(),
            }
        });
        let rewritten = rewritten.into_owned();

        for (key, id) in hits {
            self.record(context, &key, &id, MatchKind::Formula);
        }

        rewritten
    }

    /// Mappings recorded so far
    pub fn mappings(&self) -> &[ReferenceMapping] {
        &self.mappings
    }

    /// References that matched no field
    pub fn unresolved(&self) -> impl Iterator<Item = &ReferenceMapping> {
        self.mappings
            .iter()
            .filter(|m| m.kind == MatchKind::Fallback)
    }

    /// Consume the resolver, returning its mappings
    pub fn into_mappings(self) -> Vec<ReferenceMapping> {
        self.mappings
    }

    fn record(&mut self, context: &str, reference: &str, id: &CanonicalId, kind: MatchKind) {
        if kind == MatchKind::Fallback {
            tracing::warn!(
                context,
                reference,
                resolved = %id,
                "reference matched no field; using derived id"
            );
        } else {
            tracing::debug!(context, reference, resolved = %id, kind = %kind, "mapped reference");
        }

        self.mappings.push(ReferenceMapping {
            context: context.to_string(),
            reference: reference.to_string(),
            resolved: id.clone(),
            kind,
        });
    }
}

/// Alternation of every lookup key, longest first, anchored on word
/// boundaries. `None` when there is nothing to substitute.
fn build_formula_pattern(lookup: &NameLookup) -> Option<Regex> {
    if lookup.is_empty() {
        return None;
    }

    let alternation = lookup
        .keys_longest_first()
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");

    match Regex::new(&format!(r"\b(?:{alternation})\b")) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "could not build formula pattern; formulas left as written");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use metaforge_core::FieldType;

    fn car_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("Name", FieldType::Text),
            FieldSpec::new("Price", FieldType::Currency).with_label("Sale Price"),
            FieldSpec::new("Model Year", FieldType::Number),
        ]
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let fields = vec![FieldSpec::new("Revenue", FieldType::Currency)];
        assert_eq!(resolve("revenue", &fields), normalize("Revenue"));
        assert_eq!(resolve("REVENUE", &fields), normalize("Revenue"));
    }

    #[test]
    fn test_resolve_order_label_then_name_then_api_name() {
        let fields = car_fields();
        assert_eq!(
            resolve_with_kind("sale price", &fields),
            (normalize("Price"), MatchKind::Label)
        );
        assert_eq!(
            resolve_with_kind("model year", &fields),
            (normalize("Model Year"), MatchKind::Name)
        );
        assert_eq!(
            resolve_with_kind("price__C", &fields),
            (normalize("Price"), MatchKind::ApiName)
        );
    }

    #[test]
    fn test_bare_reference_matches_suffixed_field_name() {
        let fields = vec![FieldSpec::new("Price__c", FieldType::Currency)];
        assert_eq!(
            resolve_with_kind("price", &fields),
            (normalize("Price__c"), MatchKind::ApiName)
        );
        assert_eq!(resolve("PRICE__C", &fields).as_str(), "Price__c");

        let fields = vec![FieldSpec::new("Model_Year__c", FieldType::Number)];
        assert_eq!(resolve("model year", &fields).as_str(), "Model_Year__c");
    }

    #[test]
    fn test_label_beats_name_of_another_field() {
        let fields = vec![
            FieldSpec::new("Cost", FieldType::Currency),
            FieldSpec::new("Amount", FieldType::Currency).with_label("Cost"),
        ];
        assert_eq!(resolve("cost", &fields).as_str(), "Amount__c");
    }

    #[test]
    fn test_resolve_falls_back_to_derived_id() {
        let fields = car_fields();
        let (id, kind) = resolve_with_kind("Mileage Driven", &fields);
        assert_eq!(id.as_str(), "Mileage_Driven__c");
        assert_eq!(kind, MatchKind::Fallback);
    }

    #[test]
    fn test_resolve_never_fails_and_is_non_empty() {
        for reference in ["", " ", "x", "Price", "Odd.Name", "émoji 🚗"] {
            assert!(!resolve(reference, &[]).as_str().is_empty());
            assert!(!resolve(reference, &car_fields()).as_str().is_empty());
        }
    }

    #[test]
    fn test_resolver_records_mappings() {
        let fields = car_fields();
        let mut resolver = Resolver::new("Car", &fields);

        resolver.resolve_field("profile 'Standard User'", "Sale Price");
        resolver.resolve_field("profile 'Standard User'", "Color");

        let mappings = resolver.mappings();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].resolved.as_str(), "Price__c");
        assert_eq!(mappings[0].kind, MatchKind::Label);
        assert_eq!(resolver.unresolved().count(), 1);
        assert_eq!(
            mappings[1].to_string(),
            "profile 'Standard User': 'Color' -> 'Color__c' (fallback)"
        );
    }

    #[test]
    fn test_resolve_field_path() {
        let fields = car_fields();
        let mut resolver = Resolver::new("Car", &fields);

        let (object, field) = resolver.resolve_field_path("set", "Car.Sale Price");
        assert_eq!(object.qualify(&field), "Car__c.Price__c");

        let (object, field) = resolver.resolve_field_path("set", "car__c.price__c");
        assert_eq!(object.qualify(&field), "Car__c.Price__c");

        let (object, field) = resolver.resolve_field_path("set", "Model Year");
        assert_eq!(object.qualify(&field), "Car__c.Model_Year__c");

        let (object, _) = resolver.resolve_field_path("set", "Account.Name");
        assert_eq!(object.as_str(), "Account__c");
    }

    #[test]
    fn test_resolve_object_defaults_to_schema_object() {
        let fields = car_fields();
        let mut resolver = Resolver::new("Car", &fields);
        assert_eq!(resolver.resolve_object("set", None).as_str(), "Car__c");
        assert_eq!(resolver.resolve_object("set", Some("  ")).as_str(), "Car__c");
        assert_eq!(resolver.resolve_object("set", Some("CAR")).as_str(), "Car__c");
    }

    #[test]
    fn test_formula_whole_word_replacement() {
        let fields = car_fields();
        let mut resolver = Resolver::new("Car", &fields);

        let out = resolver.rewrite_formula("rule", "Price < 0 && Prices > 1");
        assert_eq!(out, "Price__c < 0 && Prices > 1");
    }

    #[test]
    fn test_formula_prefers_longest_label() {
        let fields = vec![
            FieldSpec::new("Price", FieldType::Currency),
            FieldSpec::new("Price Limit", FieldType::Currency),
        ];
        let mut resolver = Resolver::new("Car", &fields);

        let out = resolver.rewrite_formula("rule", "Price > Price Limit");
        assert_eq!(out, "Price__c > Price_Limit__c");
    }

    #[test]
    fn test_formula_rewrites_label_and_name_of_same_field() {
        let fields = vec![FieldSpec::new("Price", FieldType::Currency).with_label("Cost")];
        let mut resolver = Resolver::new("Car", &fields);
        assert_eq!(
            resolver.rewrite_formula("rule", "Cost > 0 || Price > 0"),
            "Price__c > 0 || Price__c > 0"
        );
    }

    #[test]
    fn test_formula_replaces_labels_inside_string_literals() {
        // Current behaviour, not a guarantee: the scan ignores formula syntax.
        let fields = vec![FieldSpec::new("Status", FieldType::Picklist)];
        let mut resolver = Resolver::new("Car", &fields);
        assert_eq!(
            resolver.rewrite_formula("rule", r#"TEXT(Status) = "Status""#),
            r#"TEXT(Status__c) = "Status__c""#
        );
    }

    #[test]
    fn test_formula_keys_are_case_sensitive() {
        let fields = vec![FieldSpec::new("Price", FieldType::Currency)];
        let mut resolver = Resolver::new("Car", &fields);
        assert_eq!(resolver.rewrite_formula("rule", "price < 0"), "price < 0");
    }

    #[test]
    fn test_formula_records_each_key_once() {
        let fields = car_fields();
        let mut resolver = Resolver::new("Car", &fields);
        resolver.rewrite_formula("rule 'R1'", "Price > 0 && Price < 100");
        assert_eq!(resolver.mappings().len(), 1);
        assert_eq!(resolver.mappings()[0].kind, MatchKind::Formula);
    }

    #[test]
    fn test_formula_without_fields_is_unchanged() {
        let mut resolver = Resolver::new("Car", &[]);
        assert_eq!(resolver.rewrite_formula("rule", "ISBLANK(Name)"), "ISBLANK(Name)");
    }
}
