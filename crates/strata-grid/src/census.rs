//! Distinct voxel values present in a grid.

use hashbrown::HashSet;

use crate::Grid;

/// Every distinct voxel value in `grid`, background included. Unordered.
pub fn labels(grid: &Grid) -> HashSet<u32> {
    let mut seen = HashSet::new();
    for &v in grid.data() {
        seen.insert(v);
    }
    seen
}

/// [`labels`] in ascending order, for callers that want a stable processing order.
pub fn sorted_labels(grid: &Grid) -> Vec<u32> {
    let mut out: Vec<u32> = labels(grid).into_iter().collect();
    out.sort_unstable();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridDims, UNMASKED};

    #[test]
    fn census_of_mixed_values() {
        let g = Grid::from_data(GridDims::new(6, 1, 1), vec![0, 0, 3, 3, 3, 7], UNMASKED).unwrap();
        let set = labels(&g);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&0) && set.contains(&3) && set.contains(&7));
        assert_eq!(sorted_labels(&g), vec![0, 3, 7]);
    }

    #[test]
    fn empty_grid_has_no_labels() {
        let g = Grid::zeroed(GridDims::new(0, 4, 4), UNMASKED);
        assert!(labels(&g).is_empty());
    }
}
