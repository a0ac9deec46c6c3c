//! Material category management and the category hierarchy.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod fixture;
mod form;
mod hierarchy;
mod list;
mod tree_page;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    count_children, create_category, create_category_table, delete_category,
    get_all_categories, get_category, insert_category, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{CategoryCode, CategoryFormData, CategoryId, CategoryName, CategoryNode, NewCategory};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use fixture::fixture_categories;
pub use hierarchy::{
    INDENT_UNIT_PX, RenderLines, RenderedLine, build_hierarchy, count_nodes, flatten_hierarchy,
    render_forest, render_node,
};
pub use list::get_manage_categories_page;
pub use tree_page::{get_category_tree_fragment, get_category_tree_page};
