//! Derived read model.
//!
//! Everything here is a pure function of a [`FormSnapshot`], recomputed on
//! every read.

use serde::{Deserialize, Serialize};

use crate::models::{Catalog, FormSnapshot, TestCategory, TestItem};

/// Patient fields that must be filled before leaving the first step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    FullName,
    Phone,
}

impl RequiredField {
    /// Checked in this order; guidance lists them the same way.
    pub const ALL: [RequiredField; 2] = [RequiredField::FullName, RequiredField::Phone];

    pub fn key(&self) -> &'static str {
        match self {
            RequiredField::FullName => "fullName",
            RequiredField::Phone => "phone",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequiredField::FullName => "full name",
            RequiredField::Phone => "phone",
        }
    }

    fn value<'a>(&self, form: &'a FormSnapshot) -> &'a str {
        match self {
            RequiredField::FullName => &form.patient.full_name,
            RequiredField::Phone => &form.patient.phone,
        }
    }
}

/// Validity and completion signals for the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormStatus {
    /// Catalog selections plus the free-text test when it isn't blank
    pub total_selected: usize,
    pub can_proceed_from_step0: bool,
    pub can_proceed_from_step1: bool,
    /// Blank required fields, in [`RequiredField::ALL`] order
    pub missing_patient_fields: Vec<RequiredField>,
}

impl FormStatus {
    pub fn of(form: &FormSnapshot) -> Self {
        let total_selected = total_selected(form);
        let missing_patient_fields: Vec<RequiredField> = RequiredField::ALL
            .into_iter()
            .filter(|field| field.value(form).trim().is_empty())
            .collect();

        Self {
            total_selected,
            can_proceed_from_step0: missing_patient_fields.is_empty(),
            can_proceed_from_step1: total_selected > 0,
            missing_patient_fields,
        }
    }
}

pub fn total_selected(form: &FormSnapshot) -> usize {
    form.selected_item_ids.len() + usize::from(form.other_test_trimmed().is_some())
}

/// `selected / total` badge for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryProgress {
    pub category_id: String,
    pub selected: usize,
    pub total: usize,
}

impl CategoryProgress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.selected == self.total
    }
}

/// Badges for every category, in catalog order.
pub fn category_progress(form: &FormSnapshot, catalog: &Catalog) -> Vec<CategoryProgress> {
    catalog
        .categories()
        .iter()
        .map(|category| CategoryProgress {
            category_id: category.id.clone(),
            selected: category
                .items
                .iter()
                .filter(|item| form.is_selected(&item.id))
                .count(),
            total: category.items.len(),
        })
        .collect()
}

/// Selected items of one category.
#[derive(Debug, Clone)]
pub struct SelectedGroup<'a> {
    pub category: &'a TestCategory,
    pub items: Vec<&'a TestItem>,
}

/// Selected items grouped by category in catalog order; empty groups are
/// left out. Ids unknown to the catalog don't appear here.
pub fn selected_by_category<'a>(form: &FormSnapshot, catalog: &'a Catalog) -> Vec<SelectedGroup<'a>> {
    catalog
        .categories()
        .iter()
        .filter_map(|category| {
            let items: Vec<&TestItem> = category
                .items
                .iter()
                .filter(|item| form.is_selected(&item.id))
                .collect();
            (!items.is_empty()).then_some(SelectedGroup { category, items })
        })
        .collect()
}
