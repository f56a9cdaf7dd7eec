use std::{env, path::PathBuf};

use crate::error::{PathError, PathResult};

/// Resolves a path string that may contain environment variables.
///
/// Expands `$VAR` and `${VAR}`, resolves a leading `~` to the user's home
/// directory and turns relative paths into absolute ones based on the current
/// working directory.
///
/// # Errors
///
/// * [`PathError::Empty`] if the path is empty
/// * [`PathError::CurrentDir`] if the current directory cannot be determined
/// * [`PathError::MissingEnvVar`] if a referenced variable is undefined
/// * [`PathError::UnclosedVariable`] if a `${` is never closed
///
/// # Example
///
/// ```
/// use modsync_utils::error::PathResult;
/// use modsync_utils::path::resolve_path;
///
/// fn main() -> PathResult<()> {
///     let resolved = resolve_path("$HOME/modsync/artifacts")?;
///     assert!(resolved.is_absolute());
///     Ok(())
/// }
/// ```
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    let path = path.trim();

    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let resolved = expand_variables(path)?;
    let path_buf = PathBuf::from(resolved);

    if path_buf.is_absolute() {
        Ok(path_buf)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path_buf))
            .map_err(|err| PathError::CurrentDir { source: err })
    }
}

/// Returns the user's home directory.
///
/// Checks `HOME` first and falls back to `/home/$USER`.
pub fn home_dir() -> PathBuf {
    env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| {
        let user = env::var("USER").unwrap_or_default();
        PathBuf::from(format!("/home/{user}"))
    })
}

/// Returns `$XDG_CONFIG_HOME`, defaulting to `$HOME/.config`.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns `$XDG_DATA_HOME`, defaulting to `$HOME/.local/share`.
pub fn xdg_data_home() -> PathBuf {
    env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

fn expand_variables(path: &str) -> PathResult<String> {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let var_name = consume_until(&mut chars, '}')?;
                    expand_env_var(&var_name, &mut result, path)?;
                } else {
                    let var_name = consume_var_name(&mut chars);
                    if var_name.is_empty() {
                        result.push('$');
                    } else {
                        expand_env_var(&var_name, &mut result, path)?;
                    }
                }
            }
            '~' if result.is_empty() => result.push_str(&home_dir().to_string_lossy()),
            _ => result.push(c),
        }
    }

    Ok(result)
}

fn consume_until(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    delimiter: char,
) -> PathResult<String> {
    let mut var_name = String::new();

    for c in chars.by_ref() {
        if c == delimiter {
            return Ok(var_name);
        }
        var_name.push(c);
    }

    Err(PathError::UnclosedVariable {
        input: format!("${{{var_name}"),
    })
}

fn consume_var_name(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut var_name = String::new();

    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            var_name.push(c);
            chars.next();
        } else {
            break;
        }
    }

    var_name
}

fn expand_env_var(var_name: &str, result: &mut String, original: &str) -> PathResult<()> {
    match var_name {
        "HOME" => result.push_str(&home_dir().to_string_lossy()),
        "XDG_CONFIG_HOME" => result.push_str(&xdg_config_home().to_string_lossy()),
        "XDG_DATA_HOME" => result.push_str(&xdg_data_home().to_string_lossy()),
        _ => {
            let value = env::var(var_name).map_err(|_| {
                PathError::MissingEnvVar {
                    input: original.into(),
                    var: var_name.into(),
                }
            })?;
            result.push_str(&value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_expand_variables() {
        env::set_var("MODSYNC_TEST_VAR", "test_value");
        assert_eq!(
            expand_variables("$MODSYNC_TEST_VAR/path").unwrap(),
            "test_value/path"
        );
        assert_eq!(
            expand_variables("${MODSYNC_TEST_VAR}/path").unwrap(),
            "test_value/path"
        );
        assert!(matches!(
            expand_variables("${MODSYNC_TEST_VAR"),
            Err(PathError::UnclosedVariable { .. })
        ));
        env::remove_var("MODSYNC_TEST_VAR");

        assert!(matches!(
            expand_variables("$MODSYNC_SURELY_UNSET_VAR"),
            Err(PathError::MissingEnvVar { .. })
        ));
        assert_eq!(expand_variables("cost$").unwrap(), "cost$");
    }

    #[test]
    #[serial]
    fn test_resolve_path() {
        env::set_var("HOME", "/tmp/home");

        assert!(matches!(resolve_path("  "), Err(PathError::Empty)));
        assert_eq!(
            resolve_path("/absolute/path").unwrap(),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            resolve_path("~/artifacts").unwrap(),
            PathBuf::from("/tmp/home/artifacts")
        );

        let relative = resolve_path("relative/db").unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("relative/db"));
    }

    #[test]
    #[serial]
    fn test_xdg_directories() {
        env::set_var("HOME", "/tmp/home");
        env::remove_var("XDG_CONFIG_HOME");
        env::remove_var("XDG_DATA_HOME");

        assert_eq!(xdg_config_home(), PathBuf::from("/tmp/home/.config"));
        assert_eq!(xdg_data_home(), PathBuf::from("/tmp/home/.local/share"));

        env::set_var("XDG_CONFIG_HOME", "/tmp/config");
        assert_eq!(xdg_config_home(), PathBuf::from("/tmp/config"));
        env::remove_var("XDG_CONFIG_HOME");
    }
}
