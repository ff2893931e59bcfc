//! Per-source time series over a history view

use std::sync::Arc;

use contracts::{Snapshot, SourceId, Timestamp};

/// `(timestamp, value)` points of one source, oldest first.
///
/// Holds a point-in-time view of the history taken when it was created, so
/// later appends and evictions do not affect it. Iteration is lazy and can be
/// restarted any number of times. Snapshots where the source has no reading
/// are skipped.
#[derive(Debug, Clone)]
pub struct Series {
    source_id: SourceId,
    view: Vec<Arc<Snapshot>>,
}

impl Series {
    pub(crate) fn new(source_id: SourceId, view: Vec<Arc<Snapshot>>) -> Self {
        Self { source_id, view }
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    /// Iterate the points from the start of the view
    pub fn iter(&self) -> SeriesIter<'_> {
        SeriesIter {
            source_id: &self.source_id,
            inner: self.view.iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = (Timestamp, f64);
    type IntoIter = SeriesIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`Series`]
pub struct SeriesIter<'a> {
    source_id: &'a SourceId,
    inner: std::slice::Iter<'a, Arc<Snapshot>>,
}

impl Iterator for SeriesIter<'_> {
    type Item = (Timestamp, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let source_id = self.source_id.as_str();
        self.inner.by_ref().find_map(|snapshot| {
            snapshot
                .get(source_id)
                .map(|reading| (reading.timestamp(), reading.value_c()))
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}
