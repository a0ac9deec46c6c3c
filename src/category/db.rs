//! Database operations for categories.

use std::collections::{HashMap, HashSet};

use rusqlite::{Connection, OptionalExtension, Row, types::Type};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    Error,
    category::{CategoryCode, CategoryId, CategoryName, CategoryNode, NewCategory},
};

/// Create a category with a new random ID and return it.
///
/// # Errors
///
/// Returns [Error::InvalidParent] if the parent does not exist and
/// [Error::DuplicateCategoryCode] if another category already uses the code.
pub fn create_category(
    new_category: NewCategory,
    connection: &Connection,
) -> Result<CategoryNode, Error> {
    if let Some(parent_id) = &new_category.parent_id {
        if !category_exists(parent_id, connection)? {
            return Err(Error::InvalidParent(parent_id.clone()));
        }
    }

    let category = CategoryNode {
        id: CategoryId::generate(),
        code: new_category.code,
        name: new_category.name,
        description: new_category.description,
        parent_id: new_category.parent_id,
        children: Vec::new(),
        created_at: OffsetDateTime::now_utc(),
    };

    insert_category(&category, connection)?;

    Ok(category)
}

/// Insert a category record as is, keeping its ID and creation time.
///
/// The parent is not checked, so records with dangling parent references can
/// be imported.
pub fn insert_category(category: &CategoryNode, connection: &Connection) -> Result<(), Error> {
    let created_at = category
        .created_at
        .format(&Rfc3339)
        .map_err(|error| Error::InvalidDateFormat(error.to_string()))?;

    connection.execute(
        "INSERT INTO category (id, code, name, description, parent_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        (
            category.id.as_str(),
            category.code.as_ref(),
            category.name.as_ref(),
            category.description.as_deref(),
            category.parent_id.as_ref().map(CategoryId::as_str),
            created_at,
        ),
    )?;

    Ok(())
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: &CategoryId, connection: &Connection) -> Result<CategoryNode, Error> {
    connection
        .prepare(
            "SELECT id, code, name, description, parent_id, created_at
            FROM category WHERE id = :id;",
        )?
        .query_row(&[(":id", category_id.as_str())], map_row)
        .map_err(|error| error.into())
}

/// Retrieve the flat collection of categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<CategoryNode>, Error> {
    connection
        .prepare(
            "SELECT id, code, name, description, parent_id, created_at
            FROM category ORDER BY name ASC;",
        )?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update a category's fields. Returns an error if the category doesn't exist.
///
/// # Errors
///
/// Returns [Error::CyclicParent] if the new parent is the category itself or
/// one of its descendants, and [Error::InvalidParent] if the new parent does
/// not exist.
pub fn update_category(
    category_id: &CategoryId,
    update: NewCategory,
    connection: &Connection,
) -> Result<(), Error> {
    if !category_exists(category_id, connection)? {
        return Err(Error::UpdateMissingCategory);
    }

    if let Some(parent_id) = &update.parent_id {
        if !category_exists(parent_id, connection)? {
            return Err(Error::InvalidParent(parent_id.clone()));
        }

        if is_self_or_descendant(parent_id, category_id, connection)? {
            return Err(Error::CyclicParent);
        }
    }

    connection.execute(
        "UPDATE category SET code = ?1, name = ?2, description = ?3, parent_id = ?4
        WHERE id = ?5",
        (
            update.code.as_ref(),
            update.name.as_ref(),
            update.description.as_deref(),
            update.parent_id.as_ref().map(CategoryId::as_str),
            category_id.as_str(),
        ),
    )?;

    Ok(())
}

/// Delete a category by ID. Returns an error if the category doesn't exist.
///
/// The direct children of the deleted category become root categories.
pub fn delete_category(category_id: &CategoryId, connection: &Connection) -> Result<(), Error> {
    // Using unchecked_transaction because we only have &Connection from the MutexGuard.
    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "UPDATE category SET parent_id = NULL WHERE parent_id = ?1",
        [category_id.as_str()],
    )?;

    let rows_affected =
        transaction.execute("DELETE FROM category WHERE id = ?1", [category_id.as_str()])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    transaction.commit()?;

    Ok(())
}

/// Count the direct children of every category that has at least one.
pub fn count_children(connection: &Connection) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare(
            "SELECT parent_id, COUNT(1) FROM category WHERE parent_id IS NOT NULL GROUP BY parent_id",
        )?
        .query_map((), |row| {
            let parent_id: String = row.get(0)?;
            let count = row.get(1)?;

            Ok((CategoryId::new(&parent_id), count))
        })?
        .collect();

    result.map_err(Error::from)
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT,
            parent_id TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_name ON category(name);
        CREATE INDEX IF NOT EXISTS idx_category_parent_id ON category(parent_id);",
    )?;

    Ok(())
}

fn category_exists(category_id: &CategoryId, connection: &Connection) -> Result<bool, Error> {
    let found = connection
        .query_row(
            "SELECT 1 FROM category WHERE id = ?1",
            [category_id.as_str()],
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

/// Walk up the stored parent chain of `candidate` looking for `ancestor`.
fn is_self_or_descendant(
    candidate: &CategoryId,
    ancestor: &CategoryId,
    connection: &Connection,
) -> Result<bool, Error> {
    let mut statement = connection.prepare("SELECT parent_id FROM category WHERE id = ?1")?;
    let mut visited = HashSet::new();
    let mut current = Some(candidate.clone());

    while let Some(category_id) = current {
        if &category_id == ancestor {
            return Ok(true);
        }

        if !visited.insert(category_id.clone()) {
            // The stored data already has a cycle that does not include `ancestor`.
            return Ok(false);
        }

        current = statement
            .query_row([category_id.as_str()], |row| row.get::<_, Option<String>>(0))
            .optional()?
            .flatten()
            .map(|parent_id| CategoryId::new(&parent_id));
    }

    Ok(false)
}

fn map_row(row: &Row) -> Result<CategoryNode, rusqlite::Error> {
    let raw_id: String = row.get(0)?;
    let raw_code: String = row.get(1)?;
    let raw_name: String = row.get(2)?;
    let description = row.get(3)?;
    let raw_parent_id: Option<String> = row.get(4)?;
    let raw_created_at: String = row.get(5)?;

    let created_at = OffsetDateTime::parse(&raw_created_at, &Rfc3339)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error)))?;

    Ok(CategoryNode {
        id: CategoryId::new(&raw_id),
        code: CategoryCode::new_unchecked(&raw_code),
        name: CategoryName::new_unchecked(&raw_name),
        description,
        parent_id: raw_parent_id.map(|parent_id| CategoryId::new(&parent_id)),
        children: Vec::new(),
        created_at,
    })
}
