use std::fmt::Write as _;

use es3_core::core_api::{EditReport, EntryRow, RawDocument};
use es3_core::entry::EntryForm;
use es3_core::games::GamePlugin;
use es3_core::value::Scalar;
use es3_core::view::{Presence, StructuredView};
use serde_json::{Map as JsonMap, Value as JsonValue};

const ENTRY_COL_WIDTH_KEY: usize = 32;
const ENTRY_COL_WIDTH_TYPE: usize = 8;
const ENTRY_COL_WIDTH_VALUE: usize = 36;
const MISSING_LABEL: &str = "missing";

pub fn render_plugin_list(plugins: &[&dyn GamePlugin]) -> String {
    let mut out = String::new();
    writeln!(&mut out, "Available game plugins:").expect("writing to String cannot fail");
    for plugin in plugins {
        writeln!(&mut out, "  {} - {}", plugin.id(), plugin.name())
            .expect("writing to String cannot fail");
    }
    out
}

/// One `Label: value` line per field, in field order.
pub fn render_view_text(view: &StructuredView) -> String {
    let mut out = String::new();
    for field in view.fields() {
        let value = match &field.value {
            Presence::Present(scalar) => format_scalar(scalar),
            Presence::Missing => MISSING_LABEL.to_string(),
        };
        writeln!(&mut out, "{}: {}", field.spec.label, value)
            .expect("writing to String cannot fail");
    }
    out
}

/// `{"plugin": id, "fields": {name: value}}`; missing fields are `null`.
pub fn render_view_json(view: &StructuredView) -> JsonValue {
    let mut fields = JsonMap::new();
    for field in view.fields() {
        let value = match &field.value {
            Presence::Present(scalar) => scalar.to_value(),
            Presence::Missing => JsonValue::Null,
        };
        fields.insert(field.spec.name.to_string(), value);
    }

    let mut out = JsonMap::new();
    out.insert(
        "plugin".to_string(),
        JsonValue::String(view.plugin_id().to_string()),
    );
    out.insert("fields".to_string(), JsonValue::Object(fields));
    JsonValue::Object(out)
}

pub fn render_entries_text(raw: &RawDocument) -> String {
    let mut out = String::new();
    writeln!(
        &mut out,
        "{:<key$} {:<ty$} {}",
        "KEY",
        "TYPE",
        "VALUE",
        key = ENTRY_COL_WIDTH_KEY,
        ty = ENTRY_COL_WIDTH_TYPE
    )
    .expect("writing to String cannot fail");

    for (row, entry) in raw.rows().iter().zip(raw.entries()) {
        let value = row
            .display
            .clone()
            .unwrap_or_else(|| opaque_summary(entry.value()));
        let line = format!(
            "{:<key$} {:<ty$} {}",
            fit_column(&row.key, ENTRY_COL_WIDTH_KEY),
            row.tag.as_str(),
            fit_column(&value, ENTRY_COL_WIDTH_VALUE),
            key = ENTRY_COL_WIDTH_KEY,
            ty = ENTRY_COL_WIDTH_TYPE
        );
        writeln!(&mut out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }
    out
}

/// Entries in document order. Opaque entries carry their raw value.
pub fn render_entries_json(raw: &RawDocument) -> JsonValue {
    let entries = raw
        .rows()
        .into_iter()
        .zip(raw.entries())
        .map(|(row, entry)| entry_row_json(row, entry.value()))
        .collect();
    JsonValue::Array(entries)
}

pub fn render_rejections(report: &EditReport) -> String {
    let mut out = String::new();
    for rejection in &report.rejected {
        let target = match rejection.expected {
            Some(tag) => format!("{} ({tag})", rejection.target),
            None => rejection.target.clone(),
        };
        writeln!(&mut out, "Rejected {target}: {}", rejection.reason)
            .expect("writing to String cannot fail");
    }
    out
}

fn entry_row_json(row: EntryRow, value: &JsonValue) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("key".to_string(), JsonValue::String(row.key));
    out.insert(
        "tag".to_string(),
        JsonValue::String(row.tag.as_str().to_string()),
    );
    out.insert(
        "form".to_string(),
        JsonValue::String(
            match row.form {
                EntryForm::Wrapped => "wrapped",
                EntryForm::Plain => "plain",
            }
            .to_string(),
        ),
    );
    out.insert(
        "type_name".to_string(),
        row.type_name.map_or(JsonValue::Null, JsonValue::String),
    );
    out.insert("value".to_string(), value.clone());
    JsonValue::Object(out)
}

fn format_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Integer(v) => format_number_with_commas_i64(*v),
        other => other.to_string(),
    }
}

fn opaque_summary(value: &JsonValue) -> String {
    match value {
        JsonValue::Object(map) => format!("<nested: {} keys>", map.len()),
        JsonValue::Array(items) => format!("<list: {} items>", items.len()),
        JsonValue::Null => "<null>".to_string(),
        other => other.to_string(),
    }
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out: String = value.chars().take(width - 3).collect();
    out.push_str("...");
    out
}

fn format_number_with_commas_i64(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        result.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
