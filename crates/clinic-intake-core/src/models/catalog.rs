//! Lab test catalog models.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate category id: {0}")]
    DuplicateCategory(String),

    #[error("Duplicate test item id: {0}")]
    DuplicateItem(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Display language for catalog labels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Vi,
}

/// A single orderable lab test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestItem {
    /// Unique identifier across the whole catalog
    pub id: String,
    /// English label
    #[serde(rename = "en")]
    pub label_en: String,
    /// Vietnamese label
    #[serde(rename = "vi")]
    pub label_vi: String,
}

impl TestItem {
    pub fn new(id: &str, en: &str, vi: &str) -> Self {
        Self {
            id: id.to_string(),
            label_en: en.to_string(),
            label_vi: vi.to_string(),
        }
    }

    pub fn label(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.label_en,
            Locale::Vi => &self.label_vi,
        }
    }
}

/// A named group of tests, selectable in bulk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestCategory {
    pub id: String,
    /// Display position
    pub order: u32,
    pub name_en: String,
    pub name_vi: String,
    pub items: Vec<TestItem>,
}

impl TestCategory {
    pub fn name(&self, locale: Locale) -> &str {
        match locale {
            Locale::En => &self.name_en,
            Locale::Vi => &self.name_vi,
        }
    }

    /// Item ids in display order.
    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.id.as_str())
    }
}

/// Read-only catalog of test categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<TestCategory>,
}

impl Catalog {
    /// Build a catalog, ordering categories and rejecting duplicate ids.
    pub fn new(mut categories: Vec<TestCategory>) -> CatalogResult<Self> {
        categories.sort_by_key(|c| c.order);

        let mut category_ids = HashSet::new();
        let mut item_ids = HashSet::new();
        for category in &categories {
            if !category_ids.insert(category.id.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.id.clone()));
            }
            for item in &category.items {
                if !item_ids.insert(item.id.as_str()) {
                    return Err(CatalogError::DuplicateItem(item.id.clone()));
                }
            }
        }

        Ok(Self { categories })
    }

    /// Parse a catalog from a JSON array of categories.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let categories: Vec<TestCategory> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    /// Categories in display order.
    pub fn categories(&self) -> &[TestCategory] {
        &self.categories
    }

    pub fn category(&self, category_id: &str) -> Option<&TestCategory> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    /// Item ids belonging to a category, or `None` for an unknown category.
    pub fn item_ids_in(&self, category_id: &str) -> Option<Vec<&str>> {
        self.category(category_id).map(|c| c.item_ids().collect())
    }

    pub fn item(&self, item_id: &str) -> Option<&TestItem> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter())
            .find(|i| i.id == item_id)
    }

    /// The category that owns an item.
    pub fn category_of(&self, item_id: &str) -> Option<&TestCategory> {
        self.categories
            .iter()
            .find(|c| c.items.iter().any(|i| i.id == item_id))
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    /// Filter items by a label query, ignoring case and diacritics.
    ///
    /// Every category is returned (possibly with no matching items) so the
    /// caller can keep its layout stable while the user types.
    pub fn search(&self, query: &str) -> SearchResults<'_> {
        let folded = fold_text(query.trim());
        let has_query = !folded.is_empty();

        let groups: Vec<CategoryMatches<'_>> = self
            .categories
            .iter()
            .map(|category| {
                let items = category
                    .items
                    .iter()
                    .filter(|item| {
                        !has_query
                            || fold_text(&item.label_en).contains(&folded)
                            || fold_text(&item.label_vi).contains(&folded)
                    })
                    .collect();
                CategoryMatches { category, items }
            })
            .collect();

        let match_count = if has_query {
            groups.iter().map(|g| g.items.len()).sum()
        } else {
            0
        };

        SearchResults {
            groups,
            match_count,
        }
    }

    /// The catalog shipped with the clinic.
    pub fn builtin() -> Self {
        let categories = builtin_categories();
        Self { categories }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Items of one category matching a search.
#[derive(Debug, Clone)]
pub struct CategoryMatches<'a> {
    pub category: &'a TestCategory,
    pub items: Vec<&'a TestItem>,
}

/// Result of [`Catalog::search`].
#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    pub groups: Vec<CategoryMatches<'a>>,
    /// Total matches, zero when the query is blank
    pub match_count: usize,
}

/// Lowercase and strip combining marks ("Mỡ máu" → "mo mau").
pub fn fold_text(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn category(id: &str, order: u32, en: &str, vi: &str, items: Vec<TestItem>) -> TestCategory {
    TestCategory {
        id: id.to_string(),
        order,
        name_en: en.to_string(),
        name_vi: vi.to_string(),
        items,
    }
}

fn builtin_categories() -> Vec<TestCategory> {
    vec![
        category(
            "hematology",
            1,
            "Hematology",
            "Huyết học",
            vec![
                TestItem::new("cbc", "Complete blood count (CBC)", "Tổng phân tích tế bào máu"),
                TestItem::new("esr", "Erythrocyte sedimentation rate", "Tốc độ máu lắng"),
                TestItem::new("blood_group", "Blood group ABO/Rh", "Nhóm máu ABO/Rh"),
                TestItem::new("coag", "Coagulation panel (PT/APTT)", "Đông máu cơ bản (PT/APTT)"),
            ],
        ),
        category(
            "glucose",
            2,
            "Diabetes",
            "Tiểu đường",
            vec![
                TestItem::new("fasting_glucose", "Fasting glucose", "Đường huyết lúc đói"),
                TestItem::new("hba1c", "HbA1c", "HbA1c"),
                TestItem::new("insulin", "Insulin", "Insulin"),
            ],
        ),
        category(
            "lipid",
            3,
            "Lipid profile",
            "Mỡ máu",
            vec![
                TestItem::new("cholesterol", "Total cholesterol", "Cholesterol toàn phần"),
                TestItem::new("triglycerides", "Triglycerides", "Triglycerid"),
                TestItem::new("hdl", "HDL cholesterol", "HDL cholesterol"),
                TestItem::new("ldl", "LDL cholesterol", "LDL cholesterol"),
            ],
        ),
        category(
            "liver",
            4,
            "Liver function",
            "Chức năng gan",
            vec![
                TestItem::new("ast", "AST (GOT)", "AST (GOT)"),
                TestItem::new("alt", "ALT (GPT)", "ALT (GPT)"),
                TestItem::new("ggt", "GGT", "GGT"),
                TestItem::new("bilirubin", "Total bilirubin", "Bilirubin toàn phần"),
            ],
        ),
        category(
            "kidney",
            5,
            "Kidney function",
            "Chức năng thận",
            vec![
                TestItem::new("urea", "Urea", "Urê"),
                TestItem::new("creatinine", "Creatinine", "Creatinin"),
                TestItem::new("uric_acid", "Uric acid", "Axit uric"),
            ],
        ),
        category(
            "thyroid",
            6,
            "Thyroid",
            "Tuyến giáp",
            vec![
                TestItem::new("tsh", "TSH", "TSH"),
                TestItem::new("ft4", "Free T4", "FT4"),
                TestItem::new("ft3", "Free T3", "FT3"),
            ],
        ),
        category(
            "infectious",
            7,
            "Infectious disease",
            "Bệnh truyền nhiễm",
            vec![
                TestItem::new("hbsag", "Hepatitis B surface antigen (HBsAg)", "Kháng nguyên viêm gan B (HBsAg)"),
                TestItem::new("anti_hcv", "Hepatitis C antibody (Anti-HCV)", "Kháng thể viêm gan C (Anti-HCV)"),
                TestItem::new("hiv", "HIV Ag/Ab combo", "HIV Ag/Ab"),
            ],
        ),
        category(
            "urine",
            8,
            "Urinalysis",
            "Nước tiểu",
            vec![
                TestItem::new("urinalysis", "Urinalysis (10 parameters)", "Tổng phân tích nước tiểu (10 thông số)"),
                TestItem::new("microalbumin", "Urine microalbumin", "Microalbumin niệu"),
            ],
        ),
    ]
}
