use crate::Grid;

/// Binary membership grid for `label`: `1` where `grid` equals `label`, `0` elsewhere.
///
/// The result has the same dims as `grid` and is tagged with `label`.
pub fn mask(grid: &Grid, label: u32) -> Grid {
    let mut out = Grid::zeroed(grid.dims(), label);
    for (dst, &src) in out.data_mut().iter_mut().zip(grid.data()) {
        if src == label {
            *dst = 1;
        }
    }
    out
}
