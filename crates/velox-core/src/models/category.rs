use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Look up a category name by id, falling back to a placeholder
pub fn category_name(categories: &[Category], id: i64) -> &str {
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.as_str())
        .unwrap_or("Uncategorized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_name_lookup() {
        let categories = vec![
            Category { id: 1, name: "Work".to_string() },
            Category { id: 2, name: "Study".to_string() },
        ];
        assert_eq!(category_name(&categories, 2), "Study");
        assert_eq!(category_name(&categories, -1), "Uncategorized");
    }
}
