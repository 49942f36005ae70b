use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use crate::indexer::Index;

fn path_attr(p: &std::path::Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

fn write_text_element(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Serialize an index as `<function_index>` XML.
///
/// Argument lists and return types go into text nodes (escaped) since HSL
/// arguments routinely contain `&`.
pub fn build_index_xml(index: &Index) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let root_path = path_attr(&index.root);
    let count = index.len().to_string();
    let mut root = BytesStart::new("function_index");
    root.push_attribute(("root", root_path.as_str()));
    root.push_attribute(("count", count.as_str()));
    writer.write_event(Event::Start(root))?;

    for f in index.iter() {
        let rel = path_attr(&f.relative_path);
        let line = f.line_number.to_string();
        let mut el = BytesStart::new("function");
        el.push_attribute(("name", f.name.as_str()));
        el.push_attribute(("file", rel.as_str()));
        el.push_attribute(("line", line.as_str()));
        let help = f.help_path.as_deref().map(path_attr);
        if let Some(help) = help.as_deref() {
            el.push_attribute(("help", help));
        }
        writer.write_event(Event::Start(el))?;

        write_text_element(&mut writer, "arguments", &f.arguments)?;
        write_text_element(&mut writer, "returns", &f.return_type)?;

        writer.write_event(Event::End(BytesEnd::new("function")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("function_index")))?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}
