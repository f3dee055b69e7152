// MARC tag prefixes
// Catalog fields imported from MARC records may carry their tag, e.g. "245-Title".

/// MARC tag for a catalog field, if the field maps to one
pub fn marc_tag(field: &str) -> Option<&'static str> {
    match field {
        "isbn" => Some("020"),
        "author" => Some("100"),
        "title" => Some("245"),
        "edition" => Some("250"),
        "publisher" | "publicationPlace" | "publicationYear" => Some("260"),
        "collectionTitle" | "collectionNumber" => Some("490"),
        "description" => Some("520"),
        "subjects" | "ibicSubjects" => Some("650"),
        _ => None,
    }
}

/// Remove a leading `"{tag}-"` from `value` when `field` maps to a MARC tag
pub fn strip_marc_prefix<'a>(value: &'a str, field: &str) -> &'a str {
    marc_tag(field)
        .and_then(|tag| value.strip_prefix(tag))
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(value)
}
