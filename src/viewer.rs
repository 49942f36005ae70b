use anyhow::{bail, Context, Result};
use std::path::Path;

/// Numbered lines `[start, end)` with `>>>` on `target_0`.
fn render_lines(lines: &[&str], start: usize, end: usize, target_0: usize) -> String {
    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let ln = start + i + 1;
            let marker = if start + i == target_0 { ">>>" } else { "   " };
            format!("{marker} {:>5} | {}", ln, l)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render `text` with 1-based `line_number` highlighted.
///
/// `context` limits the output to that many lines on each side of the
/// target; `None` renders the whole file.
pub fn render_source_view(text: &str, line_number: usize, context: Option<usize>) -> Result<String> {
    let lines: Vec<&str> = text.lines().collect();
    if line_number == 0 || line_number > lines.len() {
        bail!("line {line_number} is out of range (file has {} lines)", lines.len());
    }

    let target_0 = line_number - 1;
    let (start, end) = match context {
        Some(ctx) => (
            target_0.saturating_sub(ctx),
            target_0.saturating_add(ctx).saturating_add(1).min(lines.len()),
        ),
        None => (0, lines.len()),
    };
    Ok(render_lines(&lines, start, end, target_0))
}

/// Read `path` (lossy UTF-8) and render it with `line_number` highlighted.
pub fn render_file_view(path: &Path, line_number: usize, context: Option<usize>) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("File {} not found", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let body = render_source_view(&text, line_number, context)
        .with_context(|| format!("Cannot highlight {}", path.display()))?;
    Ok(format!("// {}:L{line_number}\n{body}\n", path.display()))
}
