// ---------------------------------------------------------------------------
// Multi-row header handling
// ---------------------------------------------------------------------------

/// Marker left in header fragments by merged or empty header cells.
const PLACEHOLDER_MARKER: &str = "Unnamed";

/// Carry merged header cells forward, row by row, in place.
///
/// A merged cell spanning several columns only stores its text in the
/// left-most cell. Walking each header row left to right, a blank cell takes
/// the value of the last cell seen in that row. Once a column has carried its
/// own (non-blank) value in an upper row it starts a new group, so lower rows
/// restart carrying from that column instead of spilling across groups.
pub fn fill_header_rows(rows: &mut [Vec<String>]) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut carries = vec![true; width];

    for row in rows.iter_mut() {
        row.resize(width, String::new());
        if width == 0 {
            continue;
        }
        let mut last = row[0].clone();
        for i in 1..width {
            if !carries[i] {
                last = row[i].clone();
            }
            if row[i].trim().is_empty() {
                row[i] = last.clone();
            } else {
                carries[i] = false;
                last = row[i].clone();
            }
        }
    }
}

/// Whether a header fragment carries no label.
pub fn is_placeholder(fragment: &str) -> bool {
    fragment.trim().is_empty() || fragment.contains(PLACEHOLDER_MARKER)
}

/// Merge one column's header fragments into a single label.
///
/// `("pCO2", "[mmHg]")` → `"pCO2 [mmHg]"`, `("Sample No", "")` → `"Sample No"`.
pub fn flatten<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| if is_placeholder(p.as_ref()) { "" } else { p.as_ref() })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Flatten every column of a header block (rows × columns).
pub fn flatten_columns(rows: &[Vec<String>]) -> Vec<String> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            let parts: Vec<&str> = rows
                .iter()
                .map(|r| r.get(col).map(String::as_str).unwrap_or(""))
                .collect();
            flatten(&parts)
        })
        .collect()
}

/// Title used for a measurement's chart panel: the label up to its unit.
pub fn short_label(label: &str) -> &str {
    label.split(" [").next().unwrap_or(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_part_header_joins_with_space() {
        assert_eq!(flatten(&["pCO2", "[mmHg]"]), "pCO2 [mmHg]");
    }

    #[test]
    fn blank_or_auto_named_part_is_dropped() {
        assert_eq!(flatten(&["Sample No", ""]), "Sample No");
        assert_eq!(flatten(&["Unnamed: 1_level_0", "Day"]), "Day");
        assert_eq!(flatten(&["  Titer ", "Unnamed: 4_level_1"]), "Titer");
        assert_eq!(flatten(&["", ""]), "");
    }

    #[test]
    fn inner_whitespace_is_kept() {
        assert_eq!(flatten(&["Temp. ", "[°C]"]), "Temp.  [°C]");
    }

    #[test]
    fn merged_upper_cell_carries_across_its_span() {
        let mut rows = vec![
            row(&["Sample No", "Day", "pH", "", "Via."]),
            row(&["", "", "(int.) [-]", "(ext.) [-]", "[%]"]),
        ];
        fill_header_rows(&mut rows);
        assert_eq!(
            flatten_columns(&rows),
            vec!["Sample No", "Day", "pH (int.) [-]", "pH (ext.) [-]", "Via. [%]"]
        );
    }

    #[test]
    fn lower_row_does_not_spill_into_a_new_group() {
        let mut rows = vec![row(&["A", "B"]), row(&["[x]", ""])];
        fill_header_rows(&mut rows);
        assert_eq!(rows[1], row(&["[x]", ""]));
    }

    #[test]
    fn leading_blank_header_stays_blank() {
        let mut rows = vec![row(&["", "", "Day"]), row(&["", "", ""])];
        fill_header_rows(&mut rows);
        assert_eq!(flatten_columns(&rows), vec!["", "", "Day"]);
    }

    #[test]
    fn short_label_strips_unit() {
        assert_eq!(short_label("pCO2 [mmHg]"), "pCO2");
        assert_eq!(short_label("cIVC (106 vc/mL*day)"), "cIVC (106 vc/mL*day)");
    }
}
