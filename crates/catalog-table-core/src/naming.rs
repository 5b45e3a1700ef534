//! Column naming rules.
//!
//! Metadata is keyed by column name, so names carry more weight here than in a
//! plain dataframe: an unnamed column cannot resolve metadata at all, and a few
//! characters are reserved by downstream normalized encodings.

use snafu::prelude::*;

/// Name given to arithmetic results until they are assigned into a table.
///
/// Every derived column needs *some* name so its metadata can be stored:
/// - without a name, the merged metadata would have nowhere to live;
/// - reusing the left operand's name would overwrite that operand's metadata;
/// - a random name would lose metadata on in-place updates (`t["a"] = t["a"] + 1`).
///
/// Assigning the column into a table replaces this sentinel everywhere in the
/// processing log with the destination column name.
pub const UNNAMED_VARIABLE: &str = "**TEMPORARY UNNAMED VARIABLE**";

/// Characters that may not appear in a normalized column name.
const FORBIDDEN_CHARACTERS: &[char] = &['('];

/// Errors raised when a column name cannot be used to address metadata.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum NamingError {
    /// Metadata was accessed on a column without a name.
    #[snafu(display("column must be named to have metadata"))]
    Unnamed,

    /// The name contains a character reserved for internal encodings.
    #[snafu(display("{name} contains forbidden character `{character}`"))]
    ForbiddenCharacter {
        /// The offending (already normalized) name.
        name: String,
        /// The reserved character that was found.
        character: char,
    },

    /// The name is not in snake_case.
    #[snafu(display("{object} must be snake_case. Change `{name}` to `{suggestion}`"))]
    NotSnakeCase {
        /// What kind of object was being named (for example, "column").
        object: String,
        /// The name as given.
        name: String,
        /// The snake_case form the caller should use instead.
        suggestion: String,
    },
}

/// Normalize a name to snake_case: spaces and dashes become underscores and
/// the result is lower-cased.
///
/// Fails with [`NamingError::ForbiddenCharacter`] if the normalized name
/// contains a reserved character.
pub fn underscore(name: &str) -> Result<String, NamingError> {
    let normalized = name.replace([' ', '-'], "_").to_lowercase();

    if let Some(character) = normalized.chars().find(|c| FORBIDDEN_CHARACTERS.contains(c)) {
        return ForbiddenCharacterSnafu {
            name: normalized,
            character,
        }
        .fail();
    }

    Ok(normalized)
}

/// Check that `name` is already snake_case.
///
/// `object_name` describes what is being named and is only used in the error
/// message.
pub fn validate_snake_case(name: &str, object_name: &str) -> Result<(), NamingError> {
    let suggestion = underscore(name)?;
    ensure!(
        suggestion == name,
        NotSnakeCaseSnafu {
            object: object_name,
            name,
            suggestion,
        }
    );
    Ok(())
}
