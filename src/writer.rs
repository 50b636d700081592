use crate::allocator::Allocation;
use crate::error::{ParamForgeError, PfResult};
use crate::parser::ParsedFile;
use crate::text::{apply_edits, fit_cell, Edit, WidthPolicy};
use tracing::info;

/// Replaces every allocated span with its token.
///
/// Free-width fields take the token as-is; fixed-width fields right-align it
/// into the original cell and fail rather than spill into a neighbour.
/// Everything outside the replaced spans is copied byte for byte.
pub fn write_template(parsed: &ParsedFile, allocation: &Allocation) -> PfResult<String> {
    let source = parsed.source();
    let mut edits = Vec::with_capacity(allocation.len());

    for entry in allocation.iter() {
        let span = &entry.record.span;
        let token = entry.token.as_str();

        let edit = match span.width {
            WidthPolicy::Free => Edit {
                range: source.token_range(span),
                replacement: token.to_string(),
            },
            WidthPolicy::Fixed => {
                let cell = fit_cell(token, span.cell_width(), span.cell_start > 0).ok_or_else(|| {
                    ParamForgeError::format(
                        &entry.record.section,
                        span.line + 1,
                        span.start + 1,
                        format!(
                            "token '{}' ({} chars) does not fit the {}-column cell of {}",
                            token,
                            token.len(),
                            span.cell_width(),
                            entry.record.id
                        ),
                    )
                })?;
                Edit {
                    range: source.cell_range(span),
                    replacement: cell,
                }
            }
        };
        edits.push(edit);
    }

    let template = apply_edits(source.as_str(), edits);
    info!("Template written with {} placeholders", allocation.len());
    Ok(template)
}
