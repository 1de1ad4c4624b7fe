use shapefile::dbase::{FieldValue, Record};

use crate::results::AttrTuple;

/// Longest rendered length of a single reporting field, ellipsis included.
pub const MAX_FIELD_LEN: usize = 50;
/// Character budget for a whole attribute tuple, separators included.
pub const MAX_ROW_LEN: usize = 200;
/// Rendered width of the separator between two attributes (` | `).
const SEPARATOR_LEN: usize = 3;
const ELLIPSIS: &str = "...";

/// Build the cleaned attribute tuple of one joined record: clean every
/// reporting field, drop absent values, then fit the row budget.
pub fn clean_attrs(record: &Record, fields: &[String]) -> AttrTuple {
    let mut attrs: AttrTuple = fields
        .iter()
        .filter_map(|field| record.get(field).and_then(clean_field))
        .collect();
    fit_row_budget(&mut attrs);
    attrs
}

/// Normalise one attribute value into report-safe text. `None` means the
/// value is absent and drops out of the tuple.
pub fn clean_field(value: &FieldValue) -> Option<String> {
    let raw = match value {
        FieldValue::Character(Some(s)) => s.clone(),
        FieldValue::Memo(s) => s.clone(),
        FieldValue::Numeric(Some(n)) => n.to_string(),
        FieldValue::Float(Some(n)) => n.to_string(),
        FieldValue::Integer(n) => n.to_string(),
        FieldValue::Double(n) => n.to_string(),
        FieldValue::Currency(n) => n.to_string(),
        FieldValue::Logical(Some(b)) => b.to_string(),
        FieldValue::Date(Some(d)) => {
            format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())
        }
        FieldValue::DateTime(dt) => {
            let d = dt.date();
            format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())
        }
        _ => return None,
    };

    // Strip anything that would break the delimited report text.
    let cleaned = raw
        .trim()
        .replace('\'', "")
        .replace(',', ";")
        .replace('\r', "")
        .replace('\n', "_n");

    if cleaned.is_empty() || matches!(cleaned.to_lowercase().as_str(), "none" | "null" | "nan") {
        return None;
    }
    Some(truncate_with_ellipsis(&cleaned, MAX_FIELD_LEN))
}

/// Cap the tuple's total rendered width at [`MAX_ROW_LEN`], separators
/// counted. The budget left after short fields keep their full length is
/// split evenly across the over-long ones (earlier fields take the slack),
/// instead of shaving the longest field a character at a time.
pub fn fit_row_budget(attrs: &mut AttrTuple) {
    if attrs.is_empty() {
        return;
    }
    let budget = MAX_ROW_LEN.saturating_sub(SEPARATOR_LEN * (attrs.len() - 1));
    let lens: Vec<usize> = attrs.iter().map(|a| a.chars().count()).collect();
    if lens.iter().sum::<usize>() <= budget {
        return;
    }

    // Largest uniform cap whose total fits, found by charging fields
    // shortest-first until the cap binds.
    let mut sorted = lens.clone();
    sorted.sort_unstable();
    let mut cap = 0;
    let mut slack = 0;
    let mut consumed = 0;
    for (i, &len) in sorted.iter().enumerate() {
        let remaining = sorted.len() - i;
        if consumed + len * remaining > budget {
            cap = (budget - consumed) / remaining;
            slack = (budget - consumed) % remaining;
            break;
        }
        consumed += len;
    }

    for (attr, len) in attrs.iter_mut().zip(lens) {
        if len <= cap {
            continue;
        }
        let allowed = if slack > 0 {
            slack -= 1;
            cap + 1
        } else {
            cap
        };
        if len > allowed {
            *attr = truncate_with_ellipsis(attr, allowed);
        }
    }
}

/// Truncate to at most `max` characters, ellipsis included.
fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(kept).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaning_scrubs_report_breaking_characters() {
        let value = FieldValue::Character(Some(" Jack's site, stage 2\nrear ".to_string()));
        assert_eq!(clean_field(&value).unwrap(), "Jacks site; stage 2_nrear");
    }

    #[test]
    fn absent_values_drop_out() {
        assert!(clean_field(&FieldValue::Character(None)).is_none());
        assert!(clean_field(&FieldValue::Character(Some("  ".to_string()))).is_none());
        assert!(clean_field(&FieldValue::Character(Some("None".to_string()))).is_none());
        assert!(clean_field(&FieldValue::Character(Some("NaN".to_string()))).is_none());
        assert!(clean_field(&FieldValue::Numeric(None)).is_none());
    }

    #[test]
    fn numbers_and_logicals_render_plainly() {
        assert_eq!(clean_field(&FieldValue::Numeric(Some(12.0))).unwrap(), "12");
        assert_eq!(clean_field(&FieldValue::Numeric(Some(2.5))).unwrap(), "2.5");
        assert_eq!(clean_field(&FieldValue::Integer(7)).unwrap(), "7");
        assert_eq!(clean_field(&FieldValue::Logical(Some(true))).unwrap(), "true");
    }

    #[test]
    fn long_fields_truncate_with_an_ellipsis() {
        let long = "x".repeat(80);
        let cleaned = clean_field(&FieldValue::Character(Some(long))).unwrap();
        assert_eq!(cleaned.chars().count(), MAX_FIELD_LEN);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn row_budget_splits_evenly_over_long_fields() {
        let mut attrs: AttrTuple = (0..4).map(|_| "x".repeat(50)).collect();
        fit_row_budget(&mut attrs);

        let total: usize =
            attrs.iter().map(|a| a.chars().count()).sum::<usize>() + 3 * (attrs.len() - 1);
        assert!(total <= MAX_ROW_LEN);
        // 191 chars of budget over four equal fields: three get 48, one 47.
        let lens: Vec<usize> = attrs.iter().map(|a| a.chars().count()).collect();
        assert_eq!(lens, vec![48, 48, 48, 47]);
        assert!(attrs.iter().all(|a| a.ends_with("...")));
    }

    #[test]
    fn row_budget_leaves_short_fields_alone() {
        let mut attrs: AttrTuple = ["abc", "def"].iter().map(|s| s.to_string()).collect();
        fit_row_budget(&mut attrs);
        assert_eq!(attrs.as_slice(), ["abc".to_string(), "def".to_string()]);

        let mut mixed: AttrTuple = ["short".to_string(), "y".repeat(50), "z".repeat(50)]
            .into_iter()
            .collect();
        // Two 50s and a 5 fit inside 200 with separators; nothing changes.
        fit_row_budget(&mut mixed);
        assert_eq!(mixed[0], "short");
        assert_eq!(mixed[1].chars().count(), 50);
    }
}
