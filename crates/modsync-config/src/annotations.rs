use std::any::type_name;

use documented::{Documented, DocumentedFields};
use toml_edit::{Decor, Item, RawString, Table};
use tracing::warn;

use crate::error::{ConfigError, Result};

/// Appends documentation lines as TOML comments to the given `Decor`.
///
/// Each line becomes a `# ` comment; empty lines become a bare `#`. Existing
/// prefix content is kept and separated from the new comments.
pub fn append_docs_as_toml_comments(decor: &mut Decor, docs: &str) {
    let old_prefix = decor.prefix().and_then(RawString::as_str);
    let last_line = old_prefix.and_then(|prefix| prefix.lines().last());

    let comments: String = docs
        .lines()
        .map(|line| {
            if line.is_empty() {
                "#\n".into()
            } else {
                format!("# {line}\n")
            }
        })
        .collect();

    let new_prefix = match (old_prefix, last_line) {
        (Some(prefix), Some("")) => format!("{prefix}{comments}"),
        (Some(prefix), Some(_)) => format!("{prefix}#\n{comments}"),
        _ => comments,
    };
    decor.set_prefix(new_prefix);
}

/// Annotates a TOML table with the field docs of `T`.
///
/// Keys without field docs are left untouched. The container docs of `T` are
/// only added when the table is not the document root.
pub fn annotate_toml_table<T>(table: &mut Table, is_root: bool) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if !is_root {
        append_docs_as_toml_comments(table.decor_mut(), T::DOCS);
    }

    for (mut key, item) in table.iter_mut() {
        let key_str = key.get().to_string();
        let Ok(docs) = T::get_field_docs(&key_str) else {
            warn!(
                "Field '{}' has no documentation in '{}'",
                key_str,
                type_name::<T>()
            );
            continue;
        };

        match item {
            Item::None => return Err(ConfigError::UnexpectedTomlItem(key_str)),
            Item::Value(_) => append_docs_as_toml_comments(key.leaf_decor_mut(), docs),
            Item::Table(sub_table) => append_docs_as_toml_comments(sub_table.decor_mut(), docs),
            Item::ArrayOfTables(array) => {
                if let Some(first) = array.iter_mut().next() {
                    append_docs_as_toml_comments(first.decor_mut(), docs);
                }
            }
        }
    }

    Ok(())
}
