//! Row-band clustering shared by the graph builder and the grid reconstructor.

use crate::types::WordBox;

/// Floor for the row tolerance so degenerate (zero-height) input still clusters.
pub const MIN_ROW_TOLERANCE: f64 = 1.0;

/// Median of the positive word heights among `indices` (0.0 when there are none).
pub fn median_height(words: &[WordBox], indices: &[usize]) -> f64 {
    let mut heights: Vec<f64> = indices
        .iter()
        .map(|&i| words[i].height)
        .filter(|h| *h > 0.0 && h.is_finite())
        .collect();

    if heights.is_empty() {
        return 0.0;
    }

    heights.sort_by(f64::total_cmp);
    let mid = heights.len() / 2;
    if heights.len() % 2 == 0 {
        (heights[mid - 1] + heights[mid]) / 2.0
    } else {
        heights[mid]
    }
}

/// Vertical distance within which two y-centers belong to the same row.
pub fn row_tolerance(median_height: f64, ratio: f64) -> f64 {
    (median_height * ratio).max(MIN_ROW_TOLERANCE)
}

/// Cluster `indices` into rows by y-center.
///
/// Rows come back top to bottom, each sorted left to right (arrival order
/// breaks exact x ties). A word joins the current row while its y-center is
/// within `tolerance` of the row's running mean.
pub fn cluster_rows(words: &[WordBox], indices: &[usize], tolerance: f64) -> Vec<Vec<usize>> {
    let mut sorted: Vec<usize> = indices.to_vec();
    sorted.sort_by(|&a, &b| words[a].y_center().total_cmp(&words[b].y_center()).then(a.cmp(&b)));

    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut mean = 0.0;

    for index in sorted {
        let y = words[index].y_center();
        match rows.last_mut() {
            Some(row) if (y - mean).abs() <= tolerance => {
                row.push(index);
                mean += (y - mean) / row.len() as f64;
            }
            _ => {
                rows.push(vec![index]);
                mean = y;
            }
        }
    }

    for row in &mut rows {
        row.sort_by(|&a, &b| words[a].x.total_cmp(&words[b].x).then(a.cmp(&b)));
    }

    rows
}

/// Row band index per word, for every word in `words`.
pub fn band_indices(words: &[WordBox], tolerance: f64) -> (Vec<usize>, usize) {
    let all: Vec<usize> = (0..words.len()).collect();
    let rows = cluster_rows(words, &all, tolerance);

    let mut band_of = vec![0; words.len()];
    for (band, row) in rows.iter().enumerate() {
        for &index in row {
            band_of[index] = band;
        }
    }

    (band_of, rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f64, y: f64, h: f64) -> WordBox {
        WordBox::new(text, 0.9, x, y, 30.0, h)
    }

    #[test]
    fn test_median_height_odd_and_even() {
        let words = vec![word("a", 0.0, 0.0, 10.0), word("b", 0.0, 0.0, 30.0), word("c", 0.0, 0.0, 12.0)];
        assert_eq!(median_height(&words, &[0, 1, 2]), 12.0);
        assert_eq!(median_height(&words, &[0, 2]), 11.0);
        assert_eq!(median_height(&words, &[]), 0.0);
    }

    #[test]
    fn test_row_tolerance_has_floor() {
        assert_eq!(row_tolerance(0.0, 0.5), MIN_ROW_TOLERANCE);
        assert_eq!(row_tolerance(20.0, 0.5), 10.0);
    }

    #[test]
    fn test_cluster_rows_groups_jittered_baselines() {
        let words = vec![
            word("Number", 60.0, 1.0, 10.0),
            word("123", 0.0, 20.0, 10.0),
            word("Invoice", 0.0, 0.0, 10.0),
            word("456", 60.0, 22.0, 10.0),
        ];

        let rows = cluster_rows(&words, &[0, 1, 2, 3], 5.0);
        assert_eq!(rows, vec![vec![2, 0], vec![1, 3]]);
    }

    #[test]
    fn test_band_indices_scale_with_tolerance() {
        let words = vec![word("a", 0.0, 0.0, 40.0), word("b", 50.0, 30.0, 40.0)];

        let (tight, tight_count) = band_indices(&words, 10.0);
        assert_eq!(tight_count, 2);
        assert_ne!(tight[0], tight[1]);

        let (loose, loose_count) = band_indices(&words, 40.0);
        assert_eq!(loose_count, 1);
        assert_eq!(loose[0], loose[1]);
    }
}
