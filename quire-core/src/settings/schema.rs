//! The persisted-settings schema as an explicit field descriptor table.
//!
//! The merge applied at load time is driven entirely by this table, not by
//! the runtime shape of whatever the file happens to contain:
//!
//! - `Scalar` and `Array` keys are overwritten wholesale from the raw file.
//! - `Nested` keys recurse with their own sub-table, so only fields the
//!   defaults already define are ever copied in.
//! - Raw keys absent from the table are ignored; table keys absent from the
//!   raw file keep their default. Arrays are never element-merged.

use serde_json::{Map, Value};

/// How one settings key participates in the merge.
pub enum FieldKind {
    /// Overwrite wholesale.
    Scalar,
    /// Overwrite wholesale; never element-merged.
    Array,
    /// Recurse with the given sub-table.
    Nested(&'static [Field]),
}

/// One key of the persisted schema.
pub struct Field {
    pub key: &'static str,
    pub kind: FieldKind,
}

const fn scalar(key: &'static str) -> Field {
    Field {
        key,
        kind: FieldKind::Scalar,
    }
}

const BOUNDS_FIELDS: &[Field] = &[scalar("width"), scalar("height"), scalar("x"), scalar("y")];

const GREP_REQUEST_FIELDS: &[Field] = &[
    scalar("condition"),
    scalar("start_directory"),
    scalar("file_type"),
    scalar("match_by_word"),
    scalar("case_sensitive"),
    scalar("regexp"),
    scalar("recursive"),
];

const PREFERENCE_FIELDS: &[Field] = &[
    scalar("indentSize"),
    scalar("indentBySpaces"),
    scalar("showLineNumber"),
    scalar("autoIndent"),
    scalar("wordWrap"),
    scalar("fontSize"),
    scalar("renderWhitespace"),
    scalar("lineHighlight"),
];

const PREFERENCE_BLOCK_FIELDS: &[Field] = &[
    Field {
        key: "plain",
        kind: FieldKind::Nested(PREFERENCE_FIELDS),
    },
    Field {
        key: "code",
        kind: FieldKind::Nested(PREFERENCE_FIELDS),
    },
];

const PALETTE_FIELDS: &[Field] = &[
    scalar("background"),
    scalar("foreground"),
    scalar("caret"),
    scalar("lineNumber"),
    scalar("selectionBackground"),
    scalar("link"),
];

const PALETTE_BLOCK_FIELDS: &[Field] = &[
    Field {
        key: "light",
        kind: FieldKind::Nested(PALETTE_FIELDS),
    },
    Field {
        key: "dark",
        kind: FieldKind::Nested(PALETTE_FIELDS),
    },
    Field {
        key: "system",
        kind: FieldKind::Nested(PALETTE_FIELDS),
    },
];

/// The top-level persisted schema.
pub const SETTINGS_FIELDS: &[Field] = &[
    Field {
        key: "bounds",
        kind: FieldKind::Nested(BOUNDS_FIELDS),
    },
    scalar("isMaximized"),
    Field {
        key: "history",
        kind: FieldKind::Array,
    },
    scalar("theme"),
    Field {
        key: "grepHistory",
        kind: FieldKind::Nested(GREP_REQUEST_FIELDS),
    },
    Field {
        key: "preference",
        kind: FieldKind::Nested(PREFERENCE_BLOCK_FIELDS),
    },
    Field {
        key: "palette",
        kind: FieldKind::Nested(PALETTE_BLOCK_FIELDS),
    },
];

/// Merge `raw` into `defaults` under the given table. `defaults` must hold
/// an entry of the declared shape for every table key, which the
/// `Settings`-derived default object always does.
pub fn merge(defaults: &mut Map<String, Value>, raw: &Map<String, Value>, fields: &[Field]) {
    for field in fields {
        let Some(raw_value) = raw.get(field.key) else {
            continue;
        };
        match &field.kind {
            FieldKind::Scalar | FieldKind::Array => {
                defaults.insert(field.key.to_string(), raw_value.clone());
            }
            FieldKind::Nested(sub_fields) => {
                let (Some(Value::Object(target)), Value::Object(source)) =
                    (defaults.get_mut(field.key), raw_value)
                else {
                    // The file holds a different shape here than the schema
                    // declares; nothing of it is copied.
                    continue;
                };
                merge(target, source, sub_fields);
            }
        }
    }
}
