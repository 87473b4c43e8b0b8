//! In-memory mirror of the collections the UI fetched from the backend.
//!
//! Records are kept in the order they were loaded. The admin pages update
//! their local copy after a successful API call instead of refetching; the
//! `review_*` and `set_student_role` helpers do the same here.

use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct StoreError {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

impl StoreError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn not_found(collection: &str, id: &str) -> Self {
        let mut e = Self::new("not_found", format!("{collection} record {id} not found"));
        e.details = Some(serde_json::json!({ "collection": collection, "id": id }));
        e
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(ReviewAction::Approve),
            "reject" => Some(ReviewAction::Reject),
            _ => None,
        }
    }
}

pub const STUDENT_ROLES: [&str; 2] = ["student", "admin"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub count: usize,
    pub duplicates_dropped: usize,
}

/// Normalized id: numbers and non-blank strings share one string form so a
/// request may say `7` or `"7"`.
pub fn id_key(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

pub fn record_id(record: &Value) -> Option<String> {
    record.get("id").and_then(id_key)
}

#[derive(Debug, Default)]
pub struct RecordStore {
    collections: HashMap<String, Vec<Value>>,
}

impl RecordStore {
    pub fn records(&self, collection: &str) -> &[Value] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn sizes(&self) -> Map<String, Value> {
        let mut names: Vec<&String> = self.collections.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| (name.clone(), Value::from(self.records(name).len())))
            .collect()
    }

    /// Replaces a collection. A repeated id keeps its first position and its
    /// last value. Nothing is replaced if any record is rejected.
    pub fn load(&mut self, collection: &str, records: Vec<Value>) -> Result<LoadSummary, StoreError> {
        let name = collection.trim();
        if name.is_empty() {
            return Err(StoreError::new("bad_params", "collection must not be empty"));
        }

        let mut out: Vec<Value> = Vec::with_capacity(records.len());
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut duplicates_dropped = 0;
        for (pos, record) in records.into_iter().enumerate() {
            if !record.is_object() {
                return Err(StoreError::new(
                    "bad_params",
                    format!("records[{pos}] must be an object"),
                ));
            }
            let Some(id) = record_id(&record) else {
                return Err(StoreError::new(
                    "bad_params",
                    format!("records[{pos}] has no usable id"),
                ));
            };
            match slots.get(&id) {
                Some(&slot) => {
                    if let Some(existing) = out.get_mut(slot) {
                        *existing = record;
                    }
                    duplicates_dropped += 1;
                }
                None => {
                    slots.insert(id, out.len());
                    out.push(record);
                }
            }
        }

        let summary = LoadSummary {
            count: out.len(),
            duplicates_dropped,
        };
        self.collections.insert(name.to_string(), out);
        Ok(summary)
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<&Value> {
        self.records(collection)
            .iter()
            .find(|r| record_id(r).as_deref() == Some(id))
    }

    fn get_mut(&mut self, collection: &str, id: &str) -> Result<&mut Value, StoreError> {
        self.collections
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|r| record_id(r).as_deref() == Some(id)))
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    /// Shallow merge of `fields` into the record. The id itself cannot change.
    pub fn patch(
        &mut self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Value, StoreError> {
        if let Some(new_id) = fields.get("id") {
            if id_key(new_id).as_deref() != Some(id) {
                return Err(StoreError::new("bad_params", "fields.id cannot change a record id"));
            }
        }
        let record = self.get_mut(collection, id)?;
        if let Some(obj) = record.as_object_mut() {
            for (k, v) in fields {
                obj.insert(k, v);
            }
        }
        Ok(record.clone())
    }

    pub fn remove(&mut self, collection: &str, id: &str) -> Result<Value, StoreError> {
        let rows = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let pos = rows
            .iter()
            .position(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        Ok(rows.remove(pos))
    }

    pub fn review_classroom(&mut self, id: &str, action: ReviewAction) -> Result<Value, StoreError> {
        let status = match action {
            ReviewAction::Approve => "APPROVED",
            ReviewAction::Reject => "REJECTED",
        };
        let mut fields = Map::new();
        fields.insert("class_status".into(), Value::from(status));
        self.patch("classrooms", id, fields)
    }

    pub fn review_student(&mut self, id: &str, action: ReviewAction) -> Result<Value, StoreError> {
        let mut fields = Map::new();
        fields.insert(
            "is_class_representative".into(),
            Value::from(action == ReviewAction::Approve),
        );
        self.patch("students", id, fields)
    }

    pub fn set_student_role(&mut self, id: &str, role: &str) -> Result<Value, StoreError> {
        let role = role.trim().to_ascii_lowercase();
        if !STUDENT_ROLES.contains(&role.as_str()) {
            return Err(StoreError::new(
                "bad_params",
                format!("role must be one of: {}", STUDENT_ROLES.join(", ")),
            ));
        }
        let mut fields = Map::new();
        fields.insert("role".into(), Value::from(role));
        self.patch("students", id, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded() -> RecordStore {
        let mut store = RecordStore::default();
        store
            .load(
                "classrooms",
                vec![
                    json!({"id": 1, "class_label": "A", "class_status": "PENDING"}),
                    json!({"id": 2, "class_label": "B", "class_status": "PENDING"}),
                    json!({"id": 3, "class_label": "C", "class_status": "APPROVED"}),
                ],
            )
            .expect("load");
        store
    }

    #[test]
    fn load_dedups_by_id_keeping_first_slot_last_value() {
        let mut store = RecordStore::default();
        let summary = store
            .load(
                "students",
                vec![
                    json!({"id": 5, "name": "old"}),
                    json!({"id": "6", "name": "other"}),
                    json!({"id": "5", "name": "new"}),
                ],
            )
            .expect("load");
        assert_eq!(summary, LoadSummary { count: 2, duplicates_dropped: 1 });
        let names: Vec<_> = store.records("students").iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("new"), json!("other")]);
    }

    #[test]
    fn load_rejects_bad_records_without_replacing() {
        let mut store = loaded();
        let err = store
            .load("classrooms", vec![json!({"id": 9}), json!([1, 2])])
            .expect_err("array record");
        assert_eq!(err.code, "bad_params");
        let err = store
            .load("classrooms", vec![json!({"name": "no id"})])
            .expect_err("missing id");
        assert!(err.message.contains("records[0]"));
        assert_eq!(store.records("classrooms").len(), 3);
    }

    #[test]
    fn review_actions_patch_in_place() {
        let mut store = loaded();
        let updated = store
            .review_classroom("2", ReviewAction::Approve)
            .expect("approve");
        assert_eq!(updated["class_status"], json!("APPROVED"));
        assert_eq!(store.records("classrooms")[1]["class_status"], json!("APPROVED"));

        let err = store
            .review_classroom("42", ReviewAction::Reject)
            .expect_err("missing");
        assert_eq!(err.code, "not_found");
    }

    #[test]
    fn patch_refuses_id_change() {
        let mut store = loaded();
        let mut fields = Map::new();
        fields.insert("id".into(), json!(99));
        assert_eq!(store.patch("classrooms", "1", fields).expect_err("id").code, "bad_params");

        let mut fields = Map::new();
        fields.insert("id".into(), json!(1));
        fields.insert("class_label".into(), json!("A2"));
        let rec = store.patch("classrooms", "1", fields).expect("same id is fine");
        assert_eq!(rec["class_label"], json!("A2"));
    }

    #[test]
    fn remove_preserves_order_of_the_rest() {
        let mut store = loaded();
        store.remove("classrooms", "2").expect("remove");
        let ids: Vec<_> = store.records("classrooms").iter().filter_map(record_id).collect();
        assert_eq!(ids, vec!["1".to_string(), "3".to_string()]);
        assert_eq!(store.remove("classrooms", "2").expect_err("gone").code, "not_found");
        assert_eq!(store.remove("reviews", "1").expect_err("no collection").code, "not_found");
    }

    #[test]
    fn student_role_and_representative_flag() {
        let mut store = RecordStore::default();
        store
            .load(
                "students",
                vec![json!({"id": 1, "role": "student", "is_class_representative": false})],
            )
            .expect("load");
        let rec = store.review_student("1", ReviewAction::Approve).expect("approve");
        assert_eq!(rec["is_class_representative"], json!(true));
        let rec = store.set_student_role("1", "Admin").expect("role");
        assert_eq!(rec["role"], json!("admin"));
        assert_eq!(store.set_student_role("1", "dean").expect_err("role").code, "bad_params");
    }
}
