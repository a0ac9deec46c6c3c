//! The built-in set of material categories used to seed new databases and in tests.

use time::macros::datetime;

use crate::category::{CategoryCode, CategoryId, CategoryName, CategoryNode};

/// Five categories spanning two levels: fabrics and buttons, with their sub-types.
pub fn fixture_categories() -> Vec<CategoryNode> {
    let category = |id: &str, parent_id: Option<&str>, code: &str, name: &str, description: &str| {
        CategoryNode {
            id: CategoryId::new(id),
            code: CategoryCode::new_unchecked(code),
            name: CategoryName::new_unchecked(name),
            description: Some(description.to_owned()),
            parent_id: parent_id.map(CategoryId::new),
            children: Vec::new(),
            created_at: datetime!(2024-01-15 08:30 UTC),
        }
    };

    vec![
        category("1", None, "VAI", "Vải", "Các loại vải"),
        category("2", None, "CUC", "Cúc", "Các loại cúc áo"),
        category("3", Some("1"), "VAI-COT", "Vải Cotton", "Vải cotton 100%"),
        category("4", Some("1"), "VAI-LUA", "Vải Lụa", "Vải lụa tơ tằm"),
        category("5", Some("2"), "CUC-NHU", "Cúc Nhựa", "Cúc nhựa các loại"),
    ]
}
