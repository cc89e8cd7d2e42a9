//! Minimal CSV record handling shared by the loader and the exporter.
//!
//! Records are single-line: quoted fields may contain commas and doubled
//! quotes but not line breaks. Joining flattens each line break in a field
//! to a space so every record stays readable by [`split_record`].

/// Split one CSV line into its fields.
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Join fields into one CSV line, quoting where needed.
pub fn join_record<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| quote_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_field(field: &str) -> String {
    let field = &flatten_line_breaks(field);
    if field.contains([',', '"']) || field.starts_with(' ') || field.ends_with(' ') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn flatten_line_breaks(field: &str) -> String {
    field.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
