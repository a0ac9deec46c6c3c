//! Database initialization.

use rusqlite::Connection;

use crate::{Error, category::create_category_table};

/// Create the tables for all the domain models if they do not already exist.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    create_category_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
