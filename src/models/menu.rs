use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::content::MenuItem;
use super::ContentError;

/// Menu ids double as `#anchor` targets on the public page.
fn anchor_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("static regex"))
}

/// Check one id for shape only.
pub fn validate_id(id: &str) -> Result<(), ContentError> {
    if id.is_empty() {
        return Err(ContentError::EmptyMenuId);
    }
    if !anchor_pattern().is_match(id) {
        return Err(ContentError::InvalidMenuId(id.to_string()));
    }
    Ok(())
}

/// Validate a complete menu: every id well-formed, no two alike.
/// Ids are trimmed before checking; the trimmed list is returned.
pub fn validate(items: Vec<MenuItem>) -> Result<Vec<MenuItem>, ContentError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let id = item.id.trim().to_string();
        validate_id(&id)?;
        if !seen.insert(id.clone()) {
            return Err(ContentError::DuplicateMenuId(id));
        }
        out.push(MenuItem {
            id,
            text: item.text.trim().to_string(),
        });
    }
    Ok(out)
}

/// Label shown in the settings form for an entry: the id, capitalised.
pub fn display_label(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(f) => format!("{}{}", f.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
