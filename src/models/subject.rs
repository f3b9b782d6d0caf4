use serde::{Deserialize, Serialize};

/// A catalog entry forms are grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub description: String,
}

const CATALOG: [(&str, &str, &str); 3] = [
    (
        "1",
        "Software Development",
        "Learn to build modern software with sound engineering practices",
    ),
    (
        "2",
        "Graphic Design",
        "Master the principles of graphic design and visual composition",
    ),
    (
        "3",
        "3D Animation",
        "Explore the fundamental techniques of 3D modeling and animation",
    ),
];

impl Subject {
    /// The fixed subject catalog, in display order.
    pub fn catalog() -> Vec<Subject> {
        CATALOG
            .iter()
            .map(|(id, name, description)| Subject {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect()
    }

    pub fn find(id: &str) -> Option<Subject> {
        Self::catalog().into_iter().find(|s| s.id == id)
    }

    pub fn exists(id: &str) -> bool {
        CATALOG.iter().any(|(known, _, _)| *known == id)
    }
}
