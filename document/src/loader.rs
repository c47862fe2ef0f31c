//! Reading and writing seed trees and catalog files.
//!
//! Scripts are stored as seed trees in one of three formats, chosen by file
//! extension:
//!
//! | extension            | format |
//! |----------------------|--------|
//! | `.json`              | `[{"content": "...", "children": [...]}]` |
//! | `.yaml`, `.yml`      | the same structure in YAML |
//! | `.outline`, `.txt`   | one line per node, indented four spaces (or a tab) per level |
//!
//! Outline text cannot hold a line break inside a line, so `\n` and `\\`
//! are escaped in outline content, as is leading whitespace.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use orderscript_core::{CatalogPackage, LineSeed};
use tracing::info;

use crate::error::{DocumentError, Result};

/// On-disk representation of a seed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    Json,
    Yaml,
    Outline,
}

impl ScriptFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(ScriptFormat::Json),
            "yaml" | "yml" => Ok(ScriptFormat::Yaml),
            "outline" | "txt" => Ok(ScriptFormat::Outline),
            _ => Err(DocumentError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Loads a seed tree from `path`.
pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<LineSeed>> {
    let path = path.as_ref();
    let format = ScriptFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    parse_seeds(&text, format)
}

/// Writes a seed tree to `path` in the format its extension names.
pub fn save_script(path: impl AsRef<Path>, seeds: &[LineSeed]) -> Result<()> {
    let path = path.as_ref();
    let text = render_seeds(seeds, ScriptFormat::from_path(path)?)?;
    std::fs::write(path, text)?;
    Ok(())
}

pub fn parse_seeds(text: &str, format: ScriptFormat) -> Result<Vec<LineSeed>> {
    match format {
        ScriptFormat::Json => Ok(serde_json::from_str(text)?),
        ScriptFormat::Yaml => Ok(serde_yaml::from_str(text)?),
        ScriptFormat::Outline => parse_outline(text),
    }
}

pub fn render_seeds(seeds: &[LineSeed], format: ScriptFormat) -> Result<String> {
    match format {
        ScriptFormat::Json => Ok(serde_json::to_string_pretty(seeds)?),
        ScriptFormat::Yaml => Ok(serde_yaml::to_string(seeds)?),
        ScriptFormat::Outline => Ok(render_outline(seeds)),
    }
}

/// Parses indented outline text into seeds.
///
/// # Examples
///
/// ```
/// use orderscript_document::parse_outline;
///
/// let seeds = parse_outline("@循环 -n 2\n    旁白：第一句\n    旁白：第二句\n// 结束\n").unwrap();
/// assert_eq!(seeds.len(), 2);
/// assert_eq!(seeds[0].children.len(), 2);
/// assert_eq!(seeds[1].content, "// 结束");
/// ```
///
/// # Errors
///
/// Returns [`DocumentError::Outline`] for indentation that is not a whole
/// number of levels or that skips a level.
pub fn parse_outline(text: &str) -> Result<Vec<LineSeed>> {
    let mut roots = Vec::new();
    let mut stack: Vec<LineSeed> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let (depth, content) = split_indent(raw).map_err(|message| DocumentError::Outline {
            line: index + 1,
            message,
        })?;
        if depth > stack.len() {
            return Err(DocumentError::Outline {
                line: index + 1,
                message: format!(
                    "indentation jumps from level {} to level {depth}",
                    stack.len().saturating_sub(1)
                ),
            });
        }
        while stack.len() > depth {
            close(&mut stack, &mut roots);
        }
        stack.push(LineSeed::new(unescape(content)));
    }
    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }
    Ok(roots)
}

/// Renders seeds as outline text, one line per node.
pub fn render_outline(seeds: &[LineSeed]) -> String {
    let mut out = String::new();
    for seed in seeds {
        render_seed(seed, 0, &mut out);
    }
    out
}

fn render_seed(seed: &LineSeed, depth: usize, out: &mut String) {
    out.push_str(&"    ".repeat(depth));
    out.push_str(&escape(&seed.content));
    out.push('\n');
    for child in &seed.children {
        render_seed(child, depth + 1, out);
    }
}

fn close(stack: &mut Vec<LineSeed>, roots: &mut Vec<LineSeed>) {
    let Some(done) = stack.pop() else {
        return;
    };
    match stack.last_mut() {
        Some(parent) => parent.children.push(done),
        None => roots.push(done),
    }
}

fn split_indent(raw: &str) -> std::result::Result<(usize, &str), String> {
    let mut depth = 0;
    let mut rest = raw;
    loop {
        if let Some(next) = rest.strip_prefix('\t') {
            rest = next;
        } else if let Some(next) = rest.strip_prefix("    ") {
            rest = next;
        } else {
            break;
        }
        depth += 1;
    }
    if rest.starts_with(' ') {
        if rest.trim().is_empty() {
            return Ok((depth, ""));
        }
        return Err("indentation must be a multiple of four spaces".to_string());
    }
    Ok((depth, rest))
}

// Leading whitespace would read as indentation, so it is escaped as well.
fn escape(content: &str) -> String {
    let escaped = content.replace('\\', "\\\\").replace('\n', "\\n");
    if escaped.starts_with([' ', '\t']) {
        format!("\\{escaped}")
    } else {
        escaped
    }
}

fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(c @ (' ' | '\t')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Loads a JSON or YAML [`CatalogPackage`].
///
/// Validation is left to
/// [`OrderRegistry::register_catalog`](orderscript_core::OrderRegistry::register_catalog).
pub fn load_catalog(path: impl AsRef<Path>) -> Result<CatalogPackage> {
    let path = path.as_ref();
    let reader = BufReader::new(std::fs::File::open(path)?);
    let catalog: CatalogPackage = match ScriptFormat::from_path(path)? {
        ScriptFormat::Json => serde_json::from_reader(reader)?,
        ScriptFormat::Yaml => serde_yaml::from_reader(reader)?,
        ScriptFormat::Outline => {
            return Err(DocumentError::UnsupportedFormat(path.display().to_string()));
        }
    };
    info!(
        catalog = %path.display(),
        version = %catalog.version,
        orders = catalog.order_count(),
        "Loaded catalog"
    );
    Ok(catalog)
}

/// Writes a catalog as JSON or YAML.
pub fn save_catalog(path: impl AsRef<Path>, catalog: &CatalogPackage) -> Result<()> {
    let path = path.as_ref();
    let format = ScriptFormat::from_path(path)?;
    let writer = BufWriter::new(std::fs::File::create(path)?);
    match format {
        ScriptFormat::Json => serde_json::to_writer_pretty(writer, catalog)?,
        ScriptFormat::Yaml => serde_yaml::to_writer(writer, catalog)?,
        ScriptFormat::Outline => {
            return Err(DocumentError::UnsupportedFormat(path.display().to_string()));
        }
    }
    Ok(())
}
