//! Tile-grid map of Europe keyed by ISO-3 country code.
//!
//! Every country is one square on a fixed grid that roughly follows the
//! map: column grows eastwards, row grows southwards.

/// Grid cell `(column, row)` of an ISO-3 code, if the code is on the map.
pub fn tile(code: &str) -> Option<(u8, u8)> {
    let cell = match code.to_ascii_uppercase().as_str() {
        "ISL" => (0, 0),
        "NOR" => (4, 0),
        "SWE" => (5, 0),
        "FIN" => (6, 0),

        "IRL" => (1, 1),
        "GBR" => (2, 1),
        "DNK" => (4, 1),
        "EST" => (6, 1),
        "RUS" => (7, 1),

        "NLD" => (3, 2),
        "DEU" => (4, 2),
        "POL" => (5, 2),
        "LVA" => (6, 2),
        "BLR" => (7, 2),

        "BEL" => (2, 3),
        "LUX" => (3, 3),
        "CZE" => (4, 3),
        "SVK" => (5, 3),
        "LTU" => (6, 3),
        "UKR" => (7, 3),

        "FRA" => (2, 4),
        "CHE" => (3, 4),
        "AUT" => (4, 4),
        "HUN" => (5, 4),
        "ROU" => (6, 4),
        "MDA" => (7, 4),

        "PRT" => (0, 5),
        "ESP" => (1, 5),
        "ITA" => (3, 5),
        "SVN" => (4, 5),
        "HRV" => (5, 5),
        "SRB" => (6, 5),
        "BGR" => (7, 5),

        "BIH" => (5, 6),
        "MNE" => (6, 6),
        "MKD" => (7, 6),
        "TUR" => (8, 6),

        "MLT" => (3, 7),
        "ALB" => (6, 7),
        "GRC" => (7, 7),
        "CYP" => (9, 7),

        _ => return None,
    };
    Some(cell)
}

/// Corners of the tile in plot coordinates (y up), inset by `gap` on each
/// side so neighbouring tiles stay distinguishable.
pub fn tile_polygon(code: &str, gap: f64) -> Option<[[f64; 2]; 4]> {
    let (col, row) = tile(code)?;
    let x0 = f64::from(col) + gap;
    let x1 = f64::from(col) + 1.0 - gap;
    let y0 = -f64::from(row) - 1.0 + gap;
    let y1 = -f64::from(row) - gap;
    Some([[x0, y0], [x1, y0], [x1, y1], [x0, y1]])
}

/// Centre of the tile in plot coordinates.
pub fn tile_center(code: &str) -> Option<[f64; 2]> {
    let (col, row) = tile(code)?;
    Some([f64::from(col) + 0.5, -f64::from(row) - 0.5])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_distinct_tiles() {
        let codes = [
            "ISL", "NOR", "SWE", "FIN", "IRL", "GBR", "DNK", "EST", "RUS", "NLD", "DEU", "POL",
            "LVA", "BLR", "BEL", "LUX", "CZE", "SVK", "LTU", "UKR", "FRA", "CHE", "AUT", "HUN",
            "ROU", "MDA", "PRT", "ESP", "ITA", "SVN", "HRV", "SRB", "BGR", "BIH", "MNE", "MKD",
            "TUR", "MLT", "ALB", "GRC", "CYP",
        ];
        let mut cells: Vec<(u8, u8)> = codes.iter().map(|c| tile(c).unwrap()).collect();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), codes.len());
    }

    #[test]
    fn lookup_ignores_case_and_rejects_unknown() {
        assert_eq!(tile("prt"), tile("PRT"));
        assert_eq!(tile("USA"), None);
        assert!(tile_polygon("XXX", 0.05).is_none());
    }

    #[test]
    fn polygon_sits_inside_its_cell() {
        let poly = tile_polygon("PRT", 0.1).unwrap();
        let center = tile_center("PRT").unwrap();
        assert_eq!(center, [0.5, -5.5]);
        for [x, y] in poly {
            assert!((x - center[0]).abs() <= 0.4 + 1e-9);
            assert!((y - center[1]).abs() <= 0.4 + 1e-9);
        }
    }
}
