use std::{
    fmt::Display,
    sync::atomic::{AtomicBool, Ordering},
};

use indexmap::IndexMap;
use modsync_core::ModsyncResult;
use modsync_modulemd::{read_index, read_index_file, ModuleIndex};
use modsync_utils::path::resolve_path;
use nu_ansi_term::Color;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{peaker::PriorityMax, themes::BorderCorrection, Panel, Style, Width},
};

pub static COLOR: AtomicBool = AtomicBool::new(true);

pub fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if COLOR.load(Ordering::Relaxed) {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Leading characters of a hex digest, enough to tell artifacts apart.
pub fn short_digest(digest: &str) -> &str {
    &digest[..digest.len().min(12)]
}

/// Renders `module:stream,stream` pairs, or the bare module when any stream
/// satisfies the requirement.
pub fn format_requires(dependencies: &IndexMap<String, Vec<String>>) -> String {
    dependencies
        .iter()
        .map(|(module, streams)| {
            if streams.is_empty() {
                module.clone()
            } else {
                format!("{module}:{}", streams.join(","))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_table<const N: usize>(
    title: &str,
    header: [&str; N],
    rows: Vec<[String; N]>,
) -> String {
    let mut builder = Builder::new();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }

    builder
        .build()
        .with(Panel::header(title))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .with(Width::wrap(term_width()).priority(PriorityMax::default()))
        .to_string()
}

/// Loads a module index from a file, or from standard input when `file` is `-`.
pub fn load_index(file: &str) -> ModsyncResult<ModuleIndex> {
    if file == "-" {
        return Ok(read_index(std::io::stdin().lock())?);
    }
    Ok(read_index_file(resolve_path(file)?)?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> ModsyncResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_digest() {
        assert_eq!(short_digest("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_digest("abc"), "abc");
    }

    #[test]
    fn test_format_requires() {
        let deps = IndexMap::from([
            ("platform".to_string(), vec!["f29".to_string()]),
            ("base".to_string(), vec![]),
            ("perl".to_string(), vec!["5.26".to_string(), "5.30".to_string()]),
        ]);
        assert_eq!(format_requires(&deps), "platform:f29 base perl:5.26,5.30");
        assert_eq!(format_requires(&IndexMap::new()), "");
    }

    #[test]
    fn test_render_table_contains_rows() {
        let table = render_table(
            "Streams",
            ["NSVCA", "RPMs"],
            vec![["foo:1:2:c0ffee42:noarch".to_string(), "3".to_string()]],
        );
        assert!(table.contains("Streams"));
        assert!(table.contains("NSVCA"));
        assert!(table.contains("c0ffee42"));
    }
}
