use crate::{
    datasets::DATASETS_ENDPOINT,
    grid::{ColumnDef, GridConfig, SortItem},
};

pub const DISCOVERY_ENDPOINT: &str = "/datadiscovery/";

/// The discovery endpoint evaluates a single `terms contains <value>`
/// filter; every other column is display only.
pub fn discovery_grid() -> GridConfig {
    let mut config = GridConfig::new(DISCOVERY_ENDPOINT);
    config.columns = vec![
        ColumnDef::new("id", "Dataset ID").not_filterable(),
        ColumnDef::new("name", "Dataset Name").not_filterable(),
        ColumnDef::new("terms", "Terms").only_operators(&["contains"]),
    ];
    config.initial_sorting = vec![SortItem::desc("dataset_id")];
    config.delete_enabled = false;
    config
}

pub fn datasets_grid() -> GridConfig {
    let mut config = GridConfig::new(DATASETS_ENDPOINT);
    config.columns = vec![
        ColumnDef::new("id", "ID").not_filterable(),
        ColumnDef::new("name", "Name"),
        ColumnDef::new("description", "Description"),
        ColumnDef::new("source", "Source"),
        ColumnDef::new("database", "Database"),
    ];
    config.initial_sorting = vec![SortItem::asc("name")];
    config
}
