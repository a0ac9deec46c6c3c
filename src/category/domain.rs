//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// Identifier for a material category.
///
/// Categories created through the app get a random UUID, but any non-empty
/// string is accepted so that imported data can keep its own identifiers.
/// Deserialized IDs are checked to be non-empty.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryId(String);

impl CategoryId {
    /// Create an ID from an existing string without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// Create a new, random ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CategoryId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(Error::EmptyCategoryId)
        } else {
            Ok(Self(value))
        }
    }
}

impl From<CategoryId> for String {
    fn from(value: CategoryId) -> Self {
        value.0
    }
}

impl AsRef<str> for CategoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, non-empty short mnemonic for a category, e.g. "VAI-COT".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryCode(String);

impl CategoryCode {
    /// Create a category code.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryCode] if `code` is empty or only
    /// whitespace.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();

        if code.is_empty() {
            Err(Error::EmptyCategoryCode)
        } else {
            Ok(Self(code.to_string()))
        }
    }

    /// Create a category code without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl AsRef<str> for CategoryCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryCode::new(s)
    }
}

impl TryFrom<String> for CategoryCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CategoryCode::new(&value)
    }
}

impl From<CategoryCode> for String {
    fn from(value: CategoryCode) -> Self {
        value.0
    }
}

impl Display for CategoryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, non-empty display name for a category, e.g. "Vải Cotton".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty or only
    /// whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty
    /// invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl TryFrom<String> for CategoryName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CategoryName::new(&value)
    }
}

impl From<CategoryName> for String {
    fn from(value: CategoryName) -> Self {
        value.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A material category (e.g., 'Vải', 'Cúc Nhựa').
///
/// In the flat collection `children` is empty and the hierarchy is expressed
/// only through `parent_id`. [build_hierarchy](crate::category::build_hierarchy)
/// returns copies with `children` filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    /// The unique ID of the category.
    pub id: CategoryId,
    /// A short mnemonic, e.g. "VAI-COT".
    pub code: CategoryCode,
    /// The display name.
    pub name: CategoryName,
    /// Optional free text.
    #[serde(default)]
    pub description: Option<String>,
    /// The ID of the parent category. `None` marks a root category.
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    /// The direct subcategories, in the order they appear in the flat collection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The validated fields needed to create or update a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub code: CategoryCode,
    pub name: CategoryName,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
}

/// Form data for category creation and editing.
///
/// An empty `parent_id` means the category has no parent.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: String,
}

impl TryFrom<&CategoryFormData> for NewCategory {
    type Error = Error;

    fn try_from(form: &CategoryFormData) -> Result<Self, Self::Error> {
        let code = CategoryCode::new(&form.code)?;
        let name = CategoryName::new(&form.name)?;
        let description = Some(form.description.trim())
            .filter(|description| !description.is_empty())
            .map(str::to_owned);
        let parent_id = Some(form.parent_id.trim())
            .filter(|parent_id| !parent_id.is_empty())
            .map(CategoryId::new);

        Ok(Self {
            code,
            name,
            description,
            parent_id,
        })
    }
}
