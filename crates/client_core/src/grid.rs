use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE_SIZE_OPTIONS: [u32; 3] = [20, 50, 100];
pub const DEFAULT_CELL_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortItem {
    pub field: String,
    pub sort: SortDirection,
}

impl SortItem {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sort: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sort: SortDirection::Desc,
        }
    }

    /// `-field` for descending, `field` for ascending.
    pub fn ordering_token(&self) -> String {
        match self.sort {
            SortDirection::Desc => format!("-{}", self.field),
            SortDirection::Asc => self.field.clone(),
        }
    }
}

pub fn ordering_token(model: &[SortItem]) -> Option<String> {
    model.first().map(SortItem::ordering_token)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterItem {
    pub column_field: String,
    pub operator_value: String,
    #[serde(default)]
    pub value: Option<Value>,
}

impl FilterItem {
    pub fn new(column_field: impl Into<String>, operator_value: impl Into<String>, value: Value) -> Self {
        Self {
            column_field: column_field.into(),
            operator_value: operator_value.into(),
            value: Some(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterModel {
    #[serde(default)]
    pub items: Vec<FilterItem>,
    #[serde(default)]
    pub quick_filter_values: Option<Vec<String>>,
}

impl FilterModel {
    pub fn quick_search<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: Vec::new(),
            quick_filter_values: Some(tokens.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_item(item: FilterItem) -> Self {
        Self {
            items: vec![item],
            quick_filter_values: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub filter_field: String,
    pub filter_operator: String,
    pub filter_value: Value,
}

impl FieldFilter {
    pub fn from_item(item: &FilterItem) -> Self {
        Self {
            filter_field: item.column_field.clone(),
            filter_operator: item.operator_value.clone(),
            filter_value: item.value.clone().unwrap_or(Value::Null),
        }
    }

    pub fn value_text(&self) -> String {
        match &self.filter_value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub field: String,
    pub header_name: String,
    pub filterable: bool,
    /// `None` allows every operator.
    pub filter_operators: Option<Vec<String>>,
}

impl ColumnDef {
    pub fn new(field: impl Into<String>, header_name: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header_name: header_name.into(),
            filterable: true,
            filter_operators: None,
        }
    }

    pub fn not_filterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    pub fn only_operators(mut self, operators: &[&str]) -> Self {
        self.filter_operators = Some(operators.iter().map(|op| op.to_string()).collect());
        self
    }

    pub fn allows(&self, operator: &str) -> bool {
        self.filterable
            && self
                .filter_operators
                .as_ref()
                .map_or(true, |ops| ops.iter().any(|op| op == operator))
    }
}

#[derive(Debug, Clone)]
pub struct GridConfig {
    pub endpoint: String,
    pub columns: Vec<ColumnDef>,
    pub initial_sorting: Vec<SortItem>,
    pub initial_filter: Option<FilterModel>,
    pub show_quick_filter: bool,
    pub delete_enabled: bool,
    pub page_size_options: Vec<u32>,
}

impl GridConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            columns: Vec::new(),
            initial_sorting: Vec::new(),
            initial_filter: None,
            show_quick_filter: true,
            delete_enabled: true,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
        }
    }

    pub fn column(&self, field: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.field == field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRequest {
    pub endpoint: String,
    pub page: u32,
    pub limit: u32,
    pub query: String,
    pub ordering: String,
    pub filter: Option<FieldFilter>,
}

impl CollectionRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> Default for CollectionResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

/// Splits a cell value at `max_chars` characters; the flag reports whether
/// anything was cut.
pub fn truncate_cell(value: &str, max_chars: usize) -> (&str, bool) {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => (&value[..idx], true),
        None => (value, false),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ordering_uses_minus_prefix_for_descending() {
        assert_eq!(ordering_token(&[SortItem::desc("name")]), Some("-name".into()));
        assert_eq!(ordering_token(&[SortItem::asc("name")]), Some("name".into()));
        assert_eq!(ordering_token(&[]), None);
    }

    #[test]
    fn ordering_honours_only_first_entry() {
        let model = [SortItem::asc("created_at"), SortItem::desc("name")];
        assert_eq!(ordering_token(&model), Some("created_at".into()));
    }

    #[test]
    fn filter_model_decodes_grid_shape() {
        let model: FilterModel = serde_json::from_value(json!({
            "items": [{"columnField": "terms", "operatorValue": "contains", "value": "cat"}],
            "quickFilterValues": ["alice", "bob"],
        }))
        .expect("decode");
        assert_eq!(model.items[0].column_field, "terms");
        assert_eq!(
            model.quick_filter_values,
            Some(vec!["alice".to_string(), "bob".to_string()])
        );
    }

    #[test]
    fn column_operator_restrictions() {
        let terms = ColumnDef::new("terms", "Terms").only_operators(&["contains"]);
        assert!(terms.allows("contains"));
        assert!(!terms.allows("equals"));

        let id = ColumnDef::new("id", "ID").not_filterable();
        assert!(!id.allows("equals"));
        assert!(ColumnDef::new("name", "Name").allows("startsWith"));
    }

    #[test]
    fn filter_value_text_is_unquoted() {
        let filter = FieldFilter::from_item(&FilterItem::new("terms", "contains", json!("cat")));
        assert_eq!(filter.value_text(), "cat");
        let numeric = FieldFilter::from_item(&FilterItem::new("size", ">", json!(10)));
        assert_eq!(numeric.value_text(), "10");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_cell("héllo", 2), ("hé", true));
        assert_eq!(truncate_cell("short", DEFAULT_CELL_MAX_CHARS), ("short", false));
        assert_eq!(truncate_cell("exact", 5), ("exact", false));
    }
}
