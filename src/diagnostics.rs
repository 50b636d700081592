use crate::template::TemplateManifest;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

/// Renders the manifest's tokens with their identities and bounds.
pub fn token_table(manifest: &TemplateManifest) -> String {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Token").add_attribute(Attribute::Bold),
        Cell::new("Group"),
        Cell::new("Unit"),
        Cell::new("Parameter"),
        Cell::new("Min"),
        Cell::new("Max"),
        Cell::new("Original"),
    ]);

    for e in &manifest.entries {
        table.add_row(vec![
            Cell::new(e.token.as_str()),
            Cell::new(e.group.to_string()),
            Cell::new(e.unit).set_alignment(CellAlignment::Right),
            Cell::new(&e.name),
            Cell::new(e.min).set_alignment(CellAlignment::Right),
            Cell::new(e.max).set_alignment(CellAlignment::Right),
            Cell::new(&e.original).set_alignment(CellAlignment::Right),
        ]);
    }

    format!("{}: {} tokens\n{}", manifest.file_name, manifest.entries.len(), table)
}
