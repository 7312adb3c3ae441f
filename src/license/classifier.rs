use crate::license::taxonomy::{LicenseType, Taxonomy};
use crate::models::Category;

/// Reduce a raw license identifier to the short name used in reports.
///
/// Versioned MPL and LGPL variants collapse onto their family name; anything
/// else passes through unchanged.
pub fn canonical_name(raw: &str) -> String {
    if raw.starts_with("MPL-2.0") {
        return "MPL-2.0".to_string();
    }
    if raw.starts_with("LGPL-3.0") || raw.starts_with("deprecated_LGPL-3.0") {
        return "LGPL-3.0".to_string();
    }
    raw.to_string()
}

/// Canonicalize `raw` and map it onto a compliance category.
///
/// Licenses the taxonomy does not know are treated as restricted.
pub fn categorize(raw: &str, taxonomy: &dyn Taxonomy) -> (String, Category) {
    let name = canonical_name(raw);
    if name.starts_with("0BSD") {
        return (name, Category::Notice);
    }
    let category = match taxonomy.license_type(&name) {
        Some(ty) => fold(ty),
        None => Category::Restricted,
    };
    (name, category)
}

fn fold(ty: LicenseType) -> Category {
    match ty {
        LicenseType::Notice | LicenseType::Permissive | LicenseType::Unencumbered => {
            Category::Notice
        }
        LicenseType::Reciprocal => Category::Reciprocal,
        LicenseType::Restricted | LicenseType::ByExceptionOnly | LicenseType::Forbidden => {
            Category::Restricted
        }
    }
}
