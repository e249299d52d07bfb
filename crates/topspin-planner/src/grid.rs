use topspin_core::{Side, TableGeometry, Vector2};

/// Depth of the short, middle and deep rows as a fraction of the half length.
const ROW_DEPTHS: [f64; 3] = [0.25, 0.5, 0.8];

/// Lateral position of the outer columns as a fraction of the half width.
const COLUMN_OFFSET: f64 = 0.5;

/// Aim point for keypad cell `cell` (1 to 9) on the receiver's half.
///
/// The cells are laid out like a numeric keypad seen from the receiver: `7 8 9` is the
/// deep row, `1 2 3` the row closest to the net and `5` the center of the half. Returns
/// `None` for any other cell number.
pub fn target_cell(cell: u8, receiver: Side, table: &TableGeometry) -> Option<Vector2> {
    if !(1..=9).contains(&cell) {
        return None;
    }
    let row = ((cell - 1) / 3) as usize;
    let column = ((cell - 1) % 3) as f64 - 1.0;
    let sign = receiver.sign();
    // Facing the net, the receiver's right hand points along x * sign.
    let x = sign * column * COLUMN_OFFSET * table.half_width();
    let z = sign * ROW_DEPTHS[row] * table.half_length();
    Some(Vector2::new(x, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_center_cell() {
        let table = TableGeometry::default();
        let center = target_cell(5, Side::B, &table).unwrap();
        assert_relative_eq!(center.x, 0.0);
        assert_relative_eq!(center.y, -0.685, epsilon = 1e-12);
    }

    #[test]
    fn test_cells_are_mirrored_between_sides() {
        let table = TableGeometry::default();
        for cell in 1..=9 {
            let a = target_cell(cell, Side::A, &table).unwrap();
            let b = target_cell(cell, Side::B, &table).unwrap();
            assert_relative_eq!(a, -b);
            assert!(table.contains(a.x, a.y));
        }
    }

    #[test]
    fn test_deep_row_is_farther_from_the_net() {
        let table = TableGeometry::default();
        let deep = target_cell(8, Side::A, &table).unwrap();
        let short = target_cell(2, Side::A, &table).unwrap();
        assert!(deep.y > short.y);
        assert_eq!(target_cell(0, Side::A, &table), None);
        assert_eq!(target_cell(10, Side::A, &table), None);
    }
}
