use mongodb::bson::{doc, Bson, Document};

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(Bson),
    In(Vec<Bson>),
}

/// Conjunction of equality and set-membership conditions on top-level fields.
///
/// Matching follows MongoDB: equality against an array field matches when
/// any element is equal, a missing field equals `null`, and an empty `$in`
/// matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    /// A filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.conditions
            .push((field.to_string(), Condition::Eq(value.into())));
        self
    }

    pub fn within<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.conditions
            .push((field.to_string(), Condition::In(values)));
        self
    }

    /// Query document understood by the MongoDB driver.
    pub fn to_document(&self) -> Document {
        let mut query = Document::new();
        for (field, condition) in &self.conditions {
            match condition {
                Condition::Eq(value) => {
                    query.insert(field.clone(), value.clone());
                }
                Condition::In(values) => {
                    query.insert(field.clone(), doc! { "$in": values.clone() });
                }
            }
        }
        query
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|(field, condition)| {
            let actual = document.get(field);
            match condition {
                Condition::Eq(expected) => value_matches(actual, expected),
                Condition::In(expected) => expected.iter().any(|e| value_matches(actual, e)),
            }
        })
    }
}

fn value_matches(actual: Option<&Bson>, expected: &Bson) -> bool {
    match actual {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| item == expected)
        }
        Some(value) => value == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_and_membership_combine() {
        let document = doc! { "_id": "g1", "name": "web", "inventory_id": "inv-a" };

        assert!(Filter::all().matches(&document));
        assert!(Filter::all()
            .eq("name", "web")
            .eq("inventory_id", "inv-a")
            .matches(&document));
        assert!(!Filter::all()
            .eq("name", "web")
            .eq("inventory_id", "inv-b")
            .matches(&document));
        assert!(Filter::all()
            .within("_id", ["g0", "g1"])
            .matches(&document));
    }

    #[test]
    fn empty_membership_matches_nothing() {
        let document = doc! { "_id": "g1" };
        assert!(!Filter::all()
            .within("_id", Vec::<String>::new())
            .matches(&document));
    }

    #[test]
    fn array_fields_match_any_element() {
        let team = doc! { "_id": "t1", "members": ["alice", "bob"] };

        assert!(Filter::all().eq("members", "bob").matches(&team));
        assert!(!Filter::all().eq("members", "carol").matches(&team));
    }

    #[test]
    fn missing_field_equals_null() {
        let host = doc! { "_id": "h1", "group_id": Bson::Null };
        let bare = doc! { "_id": "h2" };

        assert!(Filter::all().eq("group_id", Bson::Null).matches(&host));
        assert!(Filter::all().eq("group_id", Bson::Null).matches(&bare));
        assert!(!Filter::all().eq("group_id", "g1").matches(&bare));
    }

    #[test]
    fn renders_mongo_query() {
        let query = Filter::all()
            .eq("inventory_id", "inv-a")
            .within("group_id", ["g1", "g2"])
            .to_document();

        assert_eq!(
            query,
            doc! { "inventory_id": "inv-a", "group_id": { "$in": ["g1", "g2"] } }
        );
    }
}
