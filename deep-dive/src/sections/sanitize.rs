// Final pass over section rows: non-finite numbers become `Absent`.

use crate::sections::{Cell, Row};

/// Replace NaN and infinite numbers with `Cell::Absent`. Everything else is
/// left untouched.
pub fn sanitize_rows(rows: &mut [Row]) {
    for row in rows.iter_mut() {
        for cell in row.cells_mut() {
            if matches!(cell, Cell::Number(n) if !n.is_finite()) {
                *cell = Cell::Absent;
            }
        }
    }
}
