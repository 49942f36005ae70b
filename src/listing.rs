use crate::indexer::Index;

fn display_path(p: &std::path::Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

/// Plain-text function listing, one line per function.
///
/// ```text
/// /lib   (2 functions)
///
///   Aspirate(vol) Num    Pump/Pump.hsl:L3    [help: Pump/Pump.chm]
///   Reset()              Pump/Pump.hsl:L9
/// ```
pub fn render_listing(index: &Index) -> String {
    let mut out = format!(
        "{}   ({} function{})\n",
        display_path(&index.root),
        index.len(),
        if index.len() == 1 { "" } else { "s" }
    );

    if index.is_empty() {
        out.push_str("\nNo functions found.\n");
        return out;
    }
    out.push('\n');

    let sigs: Vec<String> = index
        .iter()
        .map(|f| {
            if f.return_type.is_empty() {
                format!("{}({})", f.name, f.arguments)
            } else {
                format!("{}({}) {}", f.name, f.arguments, f.return_type)
            }
        })
        .collect();
    let width = sigs.iter().map(|s| s.chars().count()).max().unwrap_or(0);

    for (f, sig) in index.iter().zip(&sigs) {
        let location = format!("{}:L{}", display_path(&f.relative_path), f.line_number);
        out.push_str(&format!("  {sig:<width$}    {location}"));
        if let Some(help) = &f.help_path {
            let help = help.strip_prefix(&index.root).unwrap_or(help);
            out.push_str(&format!("    [help: {}]", display_path(help)));
        }
        out.push('\n');
    }

    out
}
