use crate::criteria::SortDir;
use crate::listview::{FilterField, MatchMode, SortKey, SortKind, ViewSpec};

/// The admin list views. Each reads the store collection of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Classrooms,
    Students,
    Reviews,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::Classrooms, ViewKind::Students, ViewKind::Reviews];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "classrooms" => Some(ViewKind::Classrooms),
            "students" => Some(ViewKind::Students),
            "reviews" => Some(ViewKind::Reviews),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::Classrooms => "classrooms",
            ViewKind::Students => "students",
            ViewKind::Reviews => "reviews",
        }
    }

    pub fn collection(self) -> &'static str {
        self.as_str()
    }

    pub fn spec(self) -> ViewSpec {
        match self {
            ViewKind::Classrooms => ViewSpec {
                name: "classrooms",
                search_fields: vec!["id", "class_label", "department", "user.id"],
                filters: vec![
                    FilterField {
                        name: "status",
                        path: "class_status",
                        mode: MatchMode::Exact,
                    },
                    FilterField {
                        name: "year",
                        path: "academic_year",
                        mode: MatchMode::Exact,
                    },
                ],
                sort_keys: vec![
                    SortKey {
                        name: "id",
                        path: "id",
                        kind: SortKind::Number,
                    },
                    SortKey {
                        name: "academicYear",
                        path: "academic_year",
                        kind: SortKind::Text,
                    },
                    SortKey {
                        name: "createdAt",
                        path: "created_at",
                        kind: SortKind::Timestamp,
                    },
                ],
                default_sort: None,
            },
            ViewKind::Students => ViewSpec {
                name: "students",
                search_fields: vec!["name", "email", "phone", "role"],
                filters: vec![
                    FilterField {
                        name: "role",
                        path: "role",
                        mode: MatchMode::Exact,
                    },
                    FilterField {
                        name: "rep",
                        path: "is_class_representative",
                        mode: MatchMode::Flag,
                    },
                ],
                sort_keys: vec![SortKey {
                    name: "name",
                    path: "name",
                    kind: SortKind::Text,
                }],
                default_sort: None,
            },
            // Feedback audit: the classroom columns are nested and matched loosely.
            ViewKind::Reviews => ViewSpec {
                name: "reviews",
                search_fields: vec![
                    "teacher_fullname",
                    "lecture",
                    "user.name",
                    "classroom.department",
                ],
                filters: vec![
                    FilterField {
                        name: "status",
                        path: "classroom.class_status",
                        mode: MatchMode::Contains,
                    },
                    FilterField {
                        name: "year",
                        path: "classroom.academic_year",
                        mode: MatchMode::Contains,
                    },
                ],
                sort_keys: vec![
                    SortKey {
                        name: "createdAt",
                        path: "created_at",
                        kind: SortKind::Timestamp,
                    },
                    SortKey {
                        name: "teacher",
                        path: "teacher_fullname",
                        kind: SortKind::Text,
                    },
                ],
                default_sort: Some(("createdAt", SortDir::Desc)),
            },
        }
    }
}
