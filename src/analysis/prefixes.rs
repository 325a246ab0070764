//! Path canonicalization: ancestor-redundancy elimination and prefix chains.

use crate::store::path::{is_dotted_prefix, SEPARATOR};
use crate::store::Path;

/// Removes every path that is a strict, dot-bounded prefix of another path in
/// the set. Duplicates collapse; the result is sorted lexicographically.
///
/// A dependency on `a.b` already implies `a`, so only the most specific paths
/// are kept.
pub fn filter_common_prefixes<I, P>(paths: I) -> Vec<Path>
where
    I: IntoIterator<Item = P>,
    P: Into<Path>,
{
    let mut sorted: Vec<Path> = paths.into_iter().map(Into::into).collect();
    sorted.sort();
    sorted.dedup();

    // All descendants of `p` start with "p." and therefore form one contiguous
    // run in sorted order, beginning at the lower bound of "p.".
    let has_descendant = |p: &Path| {
        let needle = format!("{}{}", p, SEPARATOR);
        let at = sorted.partition_point(|q| q.as_str() < needle.as_str());
        sorted
            .get(at)
            .map_or(false, |q| is_dotted_prefix(p.as_str(), q.as_str()))
    };

    sorted
        .iter()
        .filter(|p| !has_descendant(p))
        .cloned()
        .collect()
}

/// Yields every `(child, parent)` pair along `path`, shortest first.
///
/// `R.foo.com` gives `(R.foo, R)` then `(R.foo.com, R.foo)`; a single
/// component gives nothing.
pub fn gen_all_prefix_pairs(path: &Path) -> impl Iterator<Item = (Path, Path)> + '_ {
    let s = path.as_str();
    let cuts: Vec<usize> = s.match_indices(SEPARATOR).map(|(i, _)| i).collect();

    (0..cuts.len()).map(move |k| {
        let parent = &s[..cuts[k]];
        let child = match cuts.get(k + 1) {
            Some(&end) => &s[..end],
            None => s,
        };
        (Path::from(child), Path::from(parent))
    })
}
