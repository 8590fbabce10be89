use std::collections::BTreeSet;

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Sample selection: which samples are shown, like toggling legend entries
// ---------------------------------------------------------------------------

/// Selected sample identifiers.
pub type SampleSelection = BTreeSet<String>;

/// Initialise a [`SampleSelection`] with every sample selected.
pub fn init_selection(dataset: &Dataset) -> SampleSelection {
    dataset.samples().into_iter().collect()
}

/// Build a selection from user-supplied ids. No ids means no constraint.
pub fn selection_from(ids: &[String]) -> Option<SampleSelection> {
    if ids.is_empty() {
        None
    } else {
        Some(ids.iter().cloned().collect())
    }
}

/// Return indices of rows whose sample passes the selection.
///
/// * No selection → every row passes
/// * An empty selection → nothing selected → every row fails
/// * Otherwise the row's sample must be in the selected set
pub fn visible_rows(dataset: &Dataset, selection: Option<&SampleSelection>) -> Vec<usize> {
    (0..dataset.len())
        .filter(|&i| match selection {
            None => true,
            Some(selected) => selected.contains(&dataset.sample_of(i)),
        })
        .collect()
}
