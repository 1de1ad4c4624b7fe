use crate::config::ThemeDefinition;
use crate::geom::GeometryKind;
use crate::results::{Accumulator, AggregatedRow, ThemeBucket};

const NIL: &str = "Nil";
const LINE_BREAK: &str = "\r\n";

/// Render one (feature, theme) bucket into its report cell: an "In polygon"
/// section, plus an "In {d}m buffer" section when the theme buffers.
pub fn format_cell(bucket: &ThemeBucket, theme: &ThemeDefinition) -> String {
    let mut cell = section("In polygon:", render_rows(&bucket.in_polygon, theme));
    if theme.buffer_distance > 0.0 {
        cell.push_str(LINE_BREAK);
        cell.push_str(&section(
            &format!("In {}m buffer:", theme.buffer_distance),
            render_rows(&bucket.in_buffer, theme),
        ));
    }
    cell
}

/// A space before a bare Nil, a line break before result rows.
fn section(header: &str, rows: Vec<String>) -> String {
    if rows.len() == 1 && rows[0] == NIL {
        format!("{header} {NIL}")
    } else {
        format!("{header}{LINE_BREAK}{}", rows.join(LINE_BREAK))
    }
}

fn render_rows(rows: &[AggregatedRow], theme: &ThemeDefinition) -> Vec<String> {
    if rows.is_empty() {
        return vec![NIL.to_string()];
    }
    let mut rendered: Vec<String> = rows.iter().map(|row| render_row(row, theme)).collect();
    rendered.sort();
    rendered
}

fn render_row(row: &AggregatedRow, theme: &ThemeDefinition) -> String {
    let attrs = &row.attrs;
    match &row.accum {
        Accumulator::Presence => match attrs.len() {
            0 => NIL.to_string(),
            1 => attrs[0].clone(),
            _ => format!("{} ({})", attrs[0], attrs[1..].join(" | ")),
        },
        Accumulator::Count(count) => match attrs.len() {
            0 => count.to_string(),
            1 => format!("{} - {}", attrs[0], count),
            _ => format!("{} ({}) - {}", attrs[0], attrs[1..].join(" | "), count),
        },
        Accumulator::Measure(total) => {
            let unit = match theme.geometry_kind {
                Some(GeometryKind::Polygon) => "ha",
                Some(GeometryKind::Line) => "km",
                _ => "",
            };
            match attrs.len() {
                0 => format!("{total:.1}{unit}"),
                1 => format!("{} - {:.1}{}", attrs[0], total, unit),
                _ => format!(
                    "{} ({}) - {:.1}{}",
                    attrs[0],
                    attrs[1..].join(" | "),
                    total,
                    unit
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckMethod;
    use crate::results::AttrTuple;
    use std::path::PathBuf;

    fn theme(method: CheckMethod, buffer: f64, kind: GeometryKind) -> ThemeDefinition {
        ThemeDefinition {
            theme_name: "Theme".to_string(),
            source_path: PathBuf::from("unused"),
            source_key: "unused".to_string(),
            definition_query: None,
            method,
            reporting_fields: vec![],
            buffer_distance: buffer,
            geometry_kind: Some(kind),
        }
    }

    fn row(attrs: &[&str], accum: Accumulator) -> AggregatedRow {
        AggregatedRow {
            attrs: attrs.iter().map(|a| a.to_string()).collect::<AttrTuple>(),
            accum,
        }
    }

    #[test]
    fn empty_buckets_render_nil_sections() {
        let bucket = ThemeBucket::default();
        let no_buffer = theme(CheckMethod::Present, 0.0, GeometryKind::Polygon);
        assert_eq!(format_cell(&bucket, &no_buffer), "In polygon: Nil");

        let buffered = theme(CheckMethod::Present, 50.0, GeometryKind::Polygon);
        assert_eq!(
            format_cell(&bucket, &buffered),
            "In polygon: Nil\r\nIn 50m buffer: Nil"
        );
    }

    #[test]
    fn presence_rows_sort_and_parenthesise_extras() {
        let bucket = ThemeBucket {
            in_polygon: vec![
                row(&["B"], Accumulator::Presence),
                row(&["A", "x", "y"], Accumulator::Presence),
            ],
            in_buffer: vec![],
        };
        let theme = theme(CheckMethod::Present, 0.0, GeometryKind::Polygon);
        assert_eq!(format_cell(&bucket, &theme), "In polygon:\r\nA (x | y)\r\nB");
    }

    #[test]
    fn count_and_measure_trailers() {
        let counts = ThemeBucket {
            in_polygon: vec![row(&["Zone1"], Accumulator::Count(3))],
            in_buffer: vec![],
        };
        let count_theme = theme(CheckMethod::Count, 0.0, GeometryKind::Polygon);
        assert_eq!(format_cell(&counts, &count_theme), "In polygon:\r\nZone1 - 3");

        let measures = ThemeBucket {
            in_polygon: vec![row(&["key"], Accumulator::Measure(5.0))],
            in_buffer: vec![],
        };
        let area_theme = theme(CheckMethod::Measure, 0.0, GeometryKind::Polygon);
        assert_eq!(
            format_cell(&measures, &area_theme),
            "In polygon:\r\nkey - 5.0ha"
        );

        let line_theme = theme(CheckMethod::Measure, 0.0, GeometryKind::Line);
        assert_eq!(
            format_cell(&measures, &line_theme),
            "In polygon:\r\nkey - 5.0km"
        );
    }

    #[test]
    fn buffer_section_renders_its_own_rows() {
        let bucket = ThemeBucket {
            in_polygon: vec![],
            in_buffer: vec![row(&["near"], Accumulator::Presence)],
        };
        let theme = theme(CheckMethod::Present, 100.0, GeometryKind::Polygon);
        assert_eq!(
            format_cell(&bucket, &theme),
            "In polygon: Nil\r\nIn 100m buffer:\r\nnear"
        );
    }
}
