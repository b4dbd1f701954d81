use super::{FieldDef, FieldKind, FormValues, ValidationErrors};
use serde_json::Value;
use std::collections::BTreeMap;

/// Read/write access to a form's current values.
pub trait FormBinding {
    fn values(&self) -> FormValues;
    fn set_values(&mut self, values: &FormValues);
}

/// Terminal form state: one text buffer per field plus focus and the
/// field-level errors of the last rejected submit.
#[derive(Debug, Clone)]
pub struct FormEditor {
    fields: Vec<FieldDef>,
    buffers: Vec<String>,
    focus: usize,
    errors: BTreeMap<String, String>,
}

impl FormEditor {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        let buffers = fields.iter().map(|f| empty_buffer(&f.kind)).collect();
        Self {
            fields,
            buffers,
            focus: 0,
            errors: BTreeMap::new(),
        }
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn buffer(&self, index: usize) -> Option<&str> {
        self.buffers.get(index).map(String::as_str)
    }

    /// Text shown for a field; secrets are masked.
    pub fn display(&self, index: usize) -> String {
        match (self.fields.get(index), self.buffers.get(index)) {
            (Some(field), Some(buffer)) if field.kind == FieldKind::Secret => "*".repeat(buffer.chars().count()),
            (_, Some(buffer)) => buffer.clone(),
            _ => String::new(),
        }
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_field(&self) -> Option<&FieldDef> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let Some(field) = self.fields.get(self.focus) else { return };
        match field.kind {
            FieldKind::Choice(_) => {}
            FieldKind::Toggle => {
                if c == ' ' {
                    self.toggle();
                }
            }
            FieldKind::Integer { .. } if !(c.is_ascii_digit() || c == '-') => {}
            _ => {
                self.buffers[self.focus].push(c);
                self.errors.remove(field.name);
            }
        }
    }

    pub fn backspace(&mut self) {
        let Some(field) = self.fields.get(self.focus) else { return };
        if matches!(field.kind, FieldKind::Choice(_) | FieldKind::Toggle) {
            return;
        }
        self.buffers[self.focus].pop();
        self.errors.remove(field.name);
    }

    /// Step a choice field forwards or backwards through its options.
    pub fn cycle(&mut self, forward: bool) {
        let Some(field) = self.fields.get(self.focus) else { return };
        let FieldKind::Choice(options) = field.kind else {
            if field.kind == FieldKind::Toggle {
                self.toggle();
            }
            return;
        };
        if options.is_empty() {
            return;
        }
        let current = options.iter().position(|o| *o == self.buffers[self.focus]);
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
        };
        self.buffers[self.focus] = options[next].to_string();
        self.errors.remove(field.name);
    }

    pub fn toggle(&mut self) {
        let Some(field) = self.fields.get(self.focus) else { return };
        if field.kind == FieldKind::Toggle {
            let on = self.buffers[self.focus] == "true";
            self.buffers[self.focus] = (!on).to_string();
            self.errors.remove(field.name);
        }
    }

    pub fn set_errors(&mut self, errors: &ValidationErrors) {
        self.errors = errors
            .0
            .iter()
            .map(|e| (e.field.clone(), e.kind.to_string()))
            .collect();
        if let Some(first) = self.fields.iter().position(|f| self.errors.contains_key(f.name)) {
            self.focus = first;
        }
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl FormBinding for FormEditor {
    /// Blank buffers are left out so validation sees them as absent.
    fn values(&self) -> FormValues {
        self.fields
            .iter()
            .zip(&self.buffers)
            .filter_map(|(field, buffer)| parse_buffer(&field.kind, buffer).map(|v| (field.name.to_string(), v)))
            .collect()
    }

    fn set_values(&mut self, values: &FormValues) {
        for (field, buffer) in self.fields.iter().zip(self.buffers.iter_mut()) {
            *buffer = match values.get(field.name) {
                Some(value) => render_value(value),
                None => empty_buffer(&field.kind),
            };
        }
        self.errors.clear();
    }
}

fn empty_buffer(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Toggle => "false".to_string(),
        _ => String::new(),
    }
}

fn parse_buffer(kind: &FieldKind, buffer: &str) -> Option<Value> {
    let trimmed = buffer.trim();
    match kind {
        FieldKind::Toggle => Some(Value::Bool(trimmed == "true")),
        _ if trimmed.is_empty() => None,
        FieldKind::Integer { .. } => Some(
            trimmed
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(trimmed.to_string())),
        ),
        FieldKind::List => Some(Value::Array(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )),
        FieldKind::Text | FieldKind::Secret | FieldKind::Choice(_) => Some(Value::String(buffer.to_string())),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::validate;
    use serde_json::json;

    fn editor() -> FormEditor {
        FormEditor::new(vec![
            FieldDef::text("account", "Account").required(),
            FieldDef::secret("token", "Token"),
            FieldDef::integer("limit", "Limit").range(1, 50),
            FieldDef::choice("scene", "Scene", &["p2p", "team"]),
            FieldDef::toggle("sync", "Sync"),
            FieldDef::list("ids", "IDs"),
        ])
    }

    #[test]
    fn values_round_trip_through_buffers() {
        let mut ed = editor();
        let stored = json!({
            "account": "alice",
            "token": "s3cret",
            "limit": 20,
            "scene": "team",
            "sync": true,
            "ids": ["bob", "carol"]
        });
        ed.set_values(stored.as_object().unwrap());
        assert_eq!(Value::Object(ed.values()), stored);
        assert_eq!(ed.display(1), "******");
        assert_eq!(ed.display(5), "bob, carol");
    }

    #[test]
    fn blank_fields_are_absent() {
        let ed = editor();
        let values = ed.values();
        assert_eq!(Value::Object(values), json!({"sync": false}));
    }

    #[test]
    fn typing_and_cycling() {
        let mut ed = editor();
        for c in "al".chars() {
            ed.insert_char(c);
        }
        ed.backspace();
        ed.focus_next();
        ed.focus_next();
        for c in "1x2".chars() {
            ed.insert_char(c);
        }
        ed.focus_next();
        ed.cycle(true);
        ed.cycle(true);
        ed.focus_next();
        ed.insert_char(' ');
        let values = ed.values();
        assert_eq!(values.get("account"), Some(&json!("a")));
        assert_eq!(values.get("limit"), Some(&json!(12)));
        assert_eq!(values.get("scene"), Some(&json!("team")));
        assert_eq!(values.get("sync"), Some(&json!(true)));

        ed.focus_prev();
        ed.cycle(false);
        assert_eq!(ed.values().get("scene"), Some(&json!("p2p")));
    }

    #[test]
    fn errors_follow_validation_and_move_focus() {
        let mut ed = editor();
        ed.focus_next();
        let errors = validate(ed.fields(), &ed.values()).unwrap_err();
        ed.set_errors(&errors);
        assert_eq!(ed.focus(), 0);
        assert_eq!(ed.error("account"), Some("is required"));
        ed.insert_char('a');
        assert!(!ed.has_errors());
    }

    #[test]
    fn unparsable_integer_stays_text_for_validation() {
        let mut ed = editor();
        let values = json!({"account": "a", "limit": "-"});
        ed.set_values(values.as_object().unwrap());
        assert_eq!(ed.values().get("limit"), Some(&json!("-")));
        assert!(validate(ed.fields(), &ed.values()).is_err());
    }
}
