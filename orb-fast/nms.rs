use orb_core::{Worker, map_ranges};

/// Surviving candidate of a non-maximum suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrengthPosition<T> {
    pub x: u32,
    pub y: u32,
    pub strength: T,
}

impl<T> StrengthPosition<T> {
    pub const fn new(x: u32, y: u32, strength: T) -> Self {
        Self { x, y, strength }
    }

    /// Whether `self` comes after `other` in raster order (row first, then column).
    #[inline]
    fn is_after(&self, other: &Self) -> bool {
        (self.y, self.x) > (other.y, other.x)
    }
}

/// Candidates of one frame row as `(x, strength)` pairs, sorted by `x`.
pub type CandidateRow<T> = Vec<(u32, T)>;

/// Sparse 2D accumulator of corner candidates.
///
/// Workers fill disjoint row ranges obtained from [`Self::rows_mut`], afterwards
/// [`Self::suppress_non_maximum`] keeps the local maxima of every 3x3 neighborhood.
///
/// Equal strengths are resolved in raster order: a neighbor located before the
/// candidate (upper row, or left in the same row) may be as strong as the candidate,
/// a neighbor located after it must be strictly weaker. Of two equally strong
/// adjacent candidates the later one survives.
#[derive(Debug, Clone)]
pub struct NonMaximumSuppression<T> {
    width: usize,
    height: usize,
    rows: Vec<CandidateRow<T>>,
}

impl<T> NonMaximumSuppression<T>
where
    T: Copy + PartialOrd + Send + Sync,
{
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: (0..height).map(|_| Vec::new()).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Adds a candidate, rows stay sorted by column.
    pub fn add_candidate(&mut self, x: u32, y: u32, strength: T) {
        debug_assert!((x as usize) < self.width && (y as usize) < self.height);
        add_to_row(&mut self.rows[y as usize], x, strength);
    }

    /// Rows `[first_row, first_row + number_rows)` for independent filling.
    pub fn rows_mut(&mut self, first_row: usize, number_rows: usize) -> &mut [CandidateRow<T>] {
        &mut self.rows[first_row..first_row + number_rows]
    }

    pub fn row(&self, y: usize) -> &[(u32, T)] {
        &self.rows[y]
    }

    pub fn candidate_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Removes all candidates, keeping the allocated rows.
    pub fn reset(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
    }

    /// Local maxima inside `[first_column, first_column + number_columns) x [first_row, first_row + number_rows)`.
    ///
    /// Border rows and columns of the buffer are never reported as they lack a full
    /// neighborhood. The result is in raster order for any worker.
    pub fn suppress_non_maximum(
        &self,
        first_column: usize,
        number_columns: usize,
        first_row: usize,
        number_rows: usize,
        worker: Option<&Worker>,
    ) -> Vec<StrengthPosition<T>> {
        debug_assert!(first_column + number_columns <= self.width);
        debug_assert!(first_row + number_rows <= self.height);

        let begin_column = first_column.max(1);
        let end_column = (first_column + number_columns).min(self.width.saturating_sub(1));
        let begin_row = first_row.max(1);
        let end_row = (first_row + number_rows).min(self.height.saturating_sub(1));

        if begin_column >= end_column || begin_row >= end_row {
            return Vec::new();
        }

        let partitions = map_ranges(worker, begin_row, end_row - begin_row, 3, |row, count| {
            self.suppress_non_maximum_subset(begin_column, end_column, row, count)
        });

        let survivors: Vec<_> = partitions.into_iter().flatten().collect();
        log::trace!("{} of {} candidates survived suppression", survivors.len(), self.candidate_count());
        survivors
    }

    fn suppress_non_maximum_subset(
        &self,
        begin_column: usize,
        end_column: usize,
        first_row: usize,
        number_rows: usize,
    ) -> Vec<StrengthPosition<T>> {
        let mut local = Vec::new();

        for y in first_row..first_row + number_rows {
            let north = &self.rows[y - 1];
            let center = &self.rows[y];
            let south = &self.rows[y + 1];

            for (index, &(x, strength)) in center.iter().enumerate() {
                let column = x as usize;
                if column < begin_column || column >= end_column {
                    continue;
                }

                // west may be equal
                if let Some(&(west_x, west_strength)) = index.checked_sub(1).map(|i| &center[i]) {
                    if west_x + 1 == x && west_strength > strength {
                        continue;
                    }
                }

                // east must be weaker
                if let Some(&(east_x, east_strength)) = center.get(index + 1) {
                    if east_x == x + 1 && east_strength >= strength {
                        continue;
                    }
                }

                if neighbors(north, x).iter().any(|&(_, s)| s > strength) {
                    continue;
                }

                if neighbors(south, x).iter().any(|&(_, s)| s >= strength) {
                    continue;
                }

                local.push(StrengthPosition::new(x, y as u32, strength));
            }
        }

        local
    }

    /// Thins arbitrary positions so that no two survivors are closer than `radius`.
    ///
    /// A position is dropped if another position within `radius` is stronger, or
    /// equally strong and later in raster order. Returns the indices of the surviving
    /// positions in input order.
    pub fn suppress_non_maximum_radius(
        width: usize,
        height: usize,
        positions: &[StrengthPosition<T>],
        radius: f32,
    ) -> Vec<usize> {
        debug_assert!(width >= 1 && height >= 1);
        debug_assert!(radius >= 1.0);

        let bin_size = (radius.ceil() as usize).max(10);
        let horizontal_bins = width.div_ceil(bin_size).max(1);
        let vertical_bins = height.div_ceil(bin_size).max(1);

        let mut bins: Vec<Vec<usize>> = vec![Vec::new(); horizontal_bins * vertical_bins];
        for (index, position) in positions.iter().enumerate() {
            let x_bin = (position.x as usize / bin_size).min(horizontal_bins - 1);
            let y_bin = (position.y as usize / bin_size).min(vertical_bins - 1);
            bins[y_bin * horizontal_bins + x_bin].push(index);
        }

        let sqr_radius = radius * radius;

        (0..positions.len())
            .filter(|&candidate_index| {
                let candidate = &positions[candidate_index];
                let x_bin = (candidate.x as usize / bin_size).min(horizontal_bins - 1);
                let y_bin = (candidate.y as usize / bin_size).min(vertical_bins - 1);

                let y_range = y_bin.saturating_sub(1)..(y_bin + 2).min(vertical_bins);
                let dominated = y_range.into_iter().any(|by| {
                    let x_range = x_bin.saturating_sub(1)..(x_bin + 2).min(horizontal_bins);
                    x_range.into_iter().any(|bx| {
                        bins[by * horizontal_bins + bx].iter().any(|&test_index| {
                            if test_index == candidate_index {
                                return false;
                            }
                            let test = &positions[test_index];
                            let dx = test.x as f32 - candidate.x as f32;
                            let dy = test.y as f32 - candidate.y as f32;
                            if dx * dx + dy * dy > sqr_radius {
                                return false;
                            }
                            test.strength > candidate.strength
                                || (test.strength == candidate.strength && test.is_after(candidate))
                        })
                    })
                });

                !dominated
            })
            .collect()
    }
}

/// Inserts a candidate keeping the row sorted by column.
#[inline]
pub fn add_to_row<T>(row: &mut CandidateRow<T>, x: u32, strength: T) {
    match row.last() {
        Some(&(last_x, _)) if last_x >= x => {
            debug_assert!(row.iter().all(|&(cx, _)| cx != x), "duplicate candidate at column {x}");
            let index = row.partition_point(|&(cx, _)| cx < x);
            row.insert(index, (x, strength));
        }
        _ => row.push((x, strength)),
    }
}

/// Candidates of `row` in the columns `[x - 1, x + 1]`.
#[inline]
fn neighbors<T>(row: &[(u32, T)], x: u32) -> &[(u32, T)] {
    let start = row.partition_point(|&(cx, _)| cx + 1 < x);
    let end = row.partition_point(|&(cx, _)| cx <= x + 1);
    &row[start..end]
}
