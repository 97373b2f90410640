//! Row-parallel execution with a sequential fallback.
//!
//! With the `parallel` feature rows are spread over rayon's pool; without it
//! (e.g. single-threaded embedders) the same closure runs row by row. Output
//! order is row order either way.

/// Run `f` for every row index and concatenate the per-row outputs.
#[cfg(feature = "parallel")]
pub(crate) fn collect_rows<T, F>(rows: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> Vec<T> + Send + Sync,
{
    use rayon::prelude::*;
    (0..rows).into_par_iter().flat_map_iter(f).collect()
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn collect_rows<T, F>(rows: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> Vec<T> + Send + Sync,
{
    (0..rows).flat_map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_concatenated_in_order() {
        let out = collect_rows(4, |row| vec![row * 10, row * 10 + 1]);
        assert_eq!(out, vec![0, 1, 10, 11, 20, 21, 30, 31]);
    }
}
