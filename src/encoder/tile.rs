//! Web Mercator slippy-tile index.

use std::f64::consts::PI;

use crate::models::TileIndex;

/// Zoom level at which blocks are numbered
pub const TILE_ZOOM: u8 = 17;

/// Tile containing (lon, lat) at `zoom`.
///
/// No clamping: latitudes at or beyond +/-90 give meaningless rows. A
/// non-finite intermediate (NaN from a latitude past the pole) becomes 0.
pub fn lon_lat_to_tile(lon: f64, lat: f64, zoom: u8) -> TileIndex {
    let n = 2f64.powi(i32::from(zoom));
    let x = (((lon + 180.0) / 360.0) * n).floor();
    let lat_rad = (lat * PI) / 180.0;
    let y = (((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0) * n).floor();

    TileIndex {
        x: to_integer(x),
        y: to_integer(y),
        z: zoom,
    }
}

/// Integers past this magnitude saturate under `as i64`
const I64_LIMIT: f64 = 9.223_372_036_854_775_807e18;

/// Floored value as an integer. Magnitudes beyond `i64` wrap modulo 2^32,
/// keeping the low bits the Morton interleave reads.
fn to_integer(v: f64) -> i64 {
    if !v.is_finite() {
        0
    } else if v.abs() < I64_LIMIT {
        v as i64
    } else {
        v.rem_euclid(4_294_967_296.0) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vientiane() {
        let tile = lon_lat_to_tile(102.6, 17.97, TILE_ZOOM);
        assert_eq!((tile.x, tile.y, tile.z), (102891, 58883, 17));
    }

    #[test]
    fn test_origin_quadrants() {
        let tile = lon_lat_to_tile(1.0, 1.0, TILE_ZOOM);
        assert_eq!((tile.x, tile.y), (65900, 65171));

        let tile = lon_lat_to_tile(-122.4194, 37.7749, TILE_ZOOM);
        assert_eq!((tile.x, tile.y), (20964, 50662));
    }

    #[test]
    fn test_low_zoom() {
        assert_eq!(lon_lat_to_tile(0.0, 0.0, 0), TileIndex { x: 0, y: 0, z: 0 });
        let tile = lon_lat_to_tile(-0.0001, 0.0001, 1);
        assert_eq!((tile.x, tile.y), (0, 0));
        let tile = lon_lat_to_tile(179.9, -60.0, 1);
        assert_eq!((tile.x, tile.y), (1, 1));
    }

    #[test]
    fn test_huge_longitude_wraps() {
        let tile = lon_lat_to_tile(1e300, 0.0, TILE_ZOOM);
        assert_eq!((tile.x, tile.y), (0, 65536));

        let tile = lon_lat_to_tile(-1e300, 0.0, TILE_ZOOM);
        assert_eq!(tile.x, 0);
    }

    #[test]
    fn test_past_pole_is_not_a_panic() {
        let tile = lon_lat_to_tile(0.0, 135.0, TILE_ZOOM);
        assert_eq!(tile.y, 0);
    }
}
