//! Help text rendering.
//!
//! Output depends only on the command data passed in, so repeated calls
//! and either engine produce byte-identical text.

use std::fmt::Write;

use crate::core::CommandDef;

/// Everything the renderer needs about one command.
#[derive(Debug, Clone, Copy)]
pub struct HelpView<'a> {
    /// Space-joined ancestor names plus the command's own name
    pub qualified_name: &'a str,
    pub def: &'a CommandDef,
    /// `(name, description)` of each subcommand, in registration order
    pub subcommands: &'a [(String, String)],
}

/// Render the help block.
///
/// ```text
/// Usage: app serve [options] <file>
///
/// Start the server
///
/// Arguments:
///   <file>  Input file
///
/// Options:
///   -p, --port <number>  Port to bind (default: 3000) (env: PORT)
///
/// Version: 1.0.0
/// ```
pub fn render(view: &HelpView<'_>) -> String {
    let def = view.def;
    let mut out = String::new();

    let mut usage = vec!["Usage:".to_string()];
    if !view.qualified_name.is_empty() {
        usage.push(view.qualified_name.to_string());
    }
    usage.push("[options]".to_string());
    if !view.subcommands.is_empty() {
        usage.push("[command]".to_string());
    }
    usage.extend(def.arguments.iter().map(|a| a.token()));
    let _ = writeln!(out, "{}\n", usage.join(" "));

    if !def.description.is_empty() {
        let _ = writeln!(out, "{}\n", def.description);
    }

    if !def.arguments.is_empty() {
        let rows: Vec<(String, String)> = def
            .arguments
            .iter()
            .map(|a| (a.token(), a.description.clone()))
            .collect();
        write_block(&mut out, "Arguments:", &rows);
    }

    let rows: Vec<(String, String)> = def
        .options
        .values()
        .filter(|o| !o.hidden)
        .map(|o| {
            let mut notes = Vec::new();
            if let Some(default) = &o.default {
                notes.push(format!("(default: {})", default));
            }
            if let Some(env) = &o.env {
                notes.push(format!("(env: {})", env));
            }
            let text = std::iter::once(o.description.as_str())
                .chain(notes.iter().map(String::as_str))
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (o.flags.raw.clone(), text)
        })
        .collect();
    if !rows.is_empty() {
        write_block(&mut out, "Options:", &rows);
    }

    if !view.subcommands.is_empty() {
        write_block(&mut out, "Commands:", view.subcommands);
    }

    if let Some(version) = &def.version {
        let _ = writeln!(out, "Version: {}", version);
    }

    out
}

fn write_block(out: &mut String, title: &str, rows: &[(String, String)]) {
    let width = rows.iter().map(|(left, _)| left.chars().count()).max().unwrap_or(0);
    let _ = writeln!(out, "{}", title);
    for (left, right) in rows {
        let line = format!("  {:<width$}  {}", left, right, width = width);
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out.push('\n');
}
