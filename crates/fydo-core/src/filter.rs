//! # Ingredient Filter Predicate
//!
//! Decides whether a product record satisfies an [`IngredientFilter`].
//!
//! ## Why Search Every Field?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Where "lait" may show up in one record                 │
//! │                                                                         │
//! │  ingredients_tags      ["en:sugar", "fr:lait-entier"]                  │
//! │  allergens_tags        ["en:milk"]                                     │
//! │  allergens_hierarchy   ["en:milk"]                                     │
//! │  allergens             "lait"                    ← raw text            │
//! │  additives_tags        ["en:e322"]                                     │
//! │  brands                "Lactel"                                        │
//! │  manufacturing_places  "France"                                        │
//! │  origins               "Lait de France"                                │
//! │  categories_tags       ["en:dairies", "fr:laits"]                      │
//! │  categories            "Produits laitiers, Laits"                      │
//! │  ingredients_text(_fr) "Lait entier, vitamine D"                       │
//! │                                                                         │
//! │  Upstream data is inconsistent about which field carries an            │
//! │  ingredient, so every one of them is searched.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Matching Rule
//! A term matches a field when it starts a word of that field: at the start
//! of the field, or right after a space, a hyphen or an open parenthesis.
//! `"oeuf"` matches `"oeufs de poule"` and `"lait, oeuf, sucre"` but never
//! `"boeuf"`.

use crate::types::{IngredientFilter, ProductRecord};

/// Namespace prefixes used by OpenFoodFacts taxonomies.
pub const NAMESPACE_PREFIXES: &[&str] = &["en:", "fr:"];

/// List-valued fields; each element is one searchable value.
pub const SEARCHABLE_TAG_FIELDS: &[&str] = &[
    "ingredients_tags",
    "allergens_tags",
    "allergens_hierarchy",
    "additives_tags",
    "categories_tags",
];

/// Text fields; the whole text is one searchable value.
pub const SEARCHABLE_TEXT_FIELDS: &[&str] = &[
    "allergens",
    "brands",
    "manufacturing_places",
    "origins",
    "categories",
    "ingredients_text",
    "ingredients_text_fr",
    "ingredients_text_en",
];

/// Characters after which a new word starts.
const WORD_BOUNDARIES: &[char] = &[' ', '-', '('];

/// Normalizes a filter term or a field value.
///
/// Lower-cases, trims and strips `en:` / `fr:` prefixes. Idempotent:
/// stacked prefixes are stripped repeatedly.
pub fn normalize_term(raw: &str) -> String {
    let mut value = raw.trim().to_lowercase();

    while let Some(rest) = NAMESPACE_PREFIXES
        .iter()
        .find_map(|prefix| value.strip_prefix(prefix))
    {
        value = rest.trim().to_string();
    }

    value
}

/// Returns true if `term` starts a word of `field`.
///
/// Both arguments must already be normalized. An empty term matches nothing.
pub fn term_matches_field(term: &str, field: &str) -> bool {
    if term.is_empty() || field.len() < term.len() {
        return false;
    }

    std::iter::once(0)
        .chain(
            field
                .char_indices()
                .filter(|(_, c)| WORD_BOUNDARIES.contains(c))
                .map(|(idx, c)| idx + c.len_utf8()),
        )
        .any(|start| field[start..].starts_with(term))
}

/// Collects every normalized searchable value of a record.
///
/// Missing or malformed fields contribute nothing.
pub fn searchable_fields(record: &ProductRecord) -> Vec<String> {
    let tags = SEARCHABLE_TAG_FIELDS
        .iter()
        .flat_map(|key| record.tags(key));

    let texts = SEARCHABLE_TEXT_FIELDS
        .iter()
        .filter_map(|key| record.text(key));

    tags.chain(texts)
        .map(normalize_term)
        .filter(|value| !value.is_empty())
        .collect()
}

/// Returns true if `record` satisfies every include and exclude term.
///
/// - each `with` term must match at least one field
/// - no `without` term may match any field
/// - an empty filter matches everything
pub fn matches_all_filters(record: &ProductRecord, filter: &IngredientFilter) -> bool {
    if filter.is_empty() {
        return true;
    }

    let fields = searchable_fields(record);
    let found = |raw_term: &String| {
        let term = normalize_term(raw_term);
        !term.is_empty() && fields.iter().any(|field| term_matches_field(&term, field))
    };

    let includes_ok = filter.with_ingredients.iter().all(|term| {
        // Terms that normalize to nothing impose no constraint.
        normalize_term(term).is_empty() || found(term)
    });
    if !includes_ok {
        return false;
    }

    !filter.without_ingredients.iter().any(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> ProductRecord {
        ProductRecord::new(json!({
            "code": "3560070614202",
            "product_name": "Brioche tranchée",
            "brands": "Harrys",
            "ingredients_tags": ["en:wheat-flour", "en:sugar", "fr:oeufs-frais"],
            "allergens_tags": ["en:gluten", "en:eggs"],
            "allergens_hierarchy": ["en:gluten", "en:eggs"],
            "allergens": "blé, oeufs",
            "additives_tags": ["en:e471"],
            "manufacturing_places": "Châteauroux, France",
            "origins": "Union Européenne",
            "categories_tags": ["en:breads", "fr:brioches"],
            "categories": "Viennoiseries, Brioches",
            "ingredients_text_fr": "Farine de blé 55%, sucre, oeufs frais 9%, beurre (lait)"
        }))
    }

    #[test]
    fn test_normalize_term() {
        assert_eq!(normalize_term("  EN:Milk "), "milk");
        assert_eq!(normalize_term("fr: Lait"), "lait");
        assert_eq!(normalize_term("Huile de Palme"), "huile de palme");
        assert_eq!(normalize_term("   "), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["en:fr:Lait", " FR:en: sucre ", "Oeuf", "en:", "e471"] {
            let once = normalize_term(raw);
            assert_eq!(normalize_term(&once), once, "not idempotent for {raw:?}");
        }
        assert_eq!(normalize_term("en:fr:Lait"), "lait");
    }

    #[test]
    fn test_term_matching_is_word_aware() {
        assert!(!term_matches_field("oeuf", "boeuf"));
        assert!(term_matches_field("oeuf", "oeufs de poule"));
        assert!(term_matches_field("oeuf", "lait, oeuf, sucre"));
        assert!(term_matches_field("oeuf", "oeuf"));
        assert!(term_matches_field("oeuf", "jaune-oeuf"));
        assert!(term_matches_field("lait", "beurre (lait)"));
        assert!(!term_matches_field("ois", "noisettes"));
        assert!(!term_matches_field("", "anything"));
        assert!(!term_matches_field("lait", ""));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = IngredientFilter::default();
        assert!(matches_all_filters(&sample_record(), &filter));
        assert!(matches_all_filters(&ProductRecord::new(json!({})), &filter));
        assert!(matches_all_filters(&ProductRecord::new(json!(null)), &filter));
    }

    #[test]
    fn test_with_terms_require_every_term() {
        let record = sample_record();

        let filter = IngredientFilter::new(["gluten", "sucre"], Vec::<String>::new());
        assert!(matches_all_filters(&record, &filter));

        let filter = IngredientFilter::new(["gluten", "chocolat"], Vec::<String>::new());
        assert!(!matches_all_filters(&record, &filter));

        // Removing the only failing term flips the result.
        let mut filter = filter;
        filter.remove_with("chocolat");
        assert!(matches_all_filters(&record, &filter));
    }

    #[test]
    fn test_without_term_rejects_on_any_hit() {
        let record = sample_record();

        let filter = IngredientFilter::new(Vec::<String>::new(), ["huile de palme"]);
        assert!(matches_all_filters(&record, &filter));

        // "lait" only appears inside the parenthesis of the ingredient text.
        let filter = filter.without_ingredient("lait");
        assert!(!matches_all_filters(&record, &filter));
    }

    #[test]
    fn test_every_field_is_searched() {
        let cases = [
            "wheat",          // ingredients_tags (hyphen compound)
            "eggs",           // allergens_tags
            "blé",            // allergens text
            "e471",           // additives_tags
            "harrys",         // brands
            "châteauroux",    // manufacturing_places
            "union",          // origins
            "breads",         // categories_tags
            "viennoiseries",  // categories text
            "beurre",         // ingredients_text_fr
        ];
        let record = sample_record();
        for term in cases {
            let filter = IngredientFilter::default().with_ingredient(term);
            assert!(matches_all_filters(&record, &filter), "{term} should be found");
        }
    }

    #[test]
    fn test_prefixes_and_case_are_ignored() {
        let record = sample_record();
        let filter = IngredientFilter::default().with_ingredient("EN:Gluten");
        assert!(matches_all_filters(&record, &filter));

        let raw = IngredientFilter {
            with_ingredients: vec!["FR:Sugar".to_string()],
            without_ingredients: vec![],
        };
        assert!(matches_all_filters(&record, &raw));
    }

    #[test]
    fn test_sparse_record_degrades_gracefully() {
        let record = ProductRecord::new(json!({
            "code": "1",
            "ingredients_tags": [1, null, {"id": "en:milk"}],
            "brands": 42
        }));
        let filter = IngredientFilter::default().with_ingredient("milk");
        assert!(!matches_all_filters(&record, &filter));

        let filter = IngredientFilter::default().without_ingredient("milk");
        assert!(matches_all_filters(&record, &filter));
    }
}
