//! Footprint resolution for candidate assets.
//!
//! Footprints come from georeferencing *metadata* only: GeoTIFF tags for
//! rasters, coordinate arrays for GeoJSON. No pixel data is touched and no
//! reprojection is attempted; sources that are not already WGS84 report no
//! footprint and are skipped upstream.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use async_trait::async_trait;
use stac_common::{BoundingBox, CatalogError, CatalogResult};

/// Resolves the WGS84 footprint bounds of an asset, when derivable.
#[async_trait]
pub trait FootprintProvider: Send + Sync {
    async fn footprint(&self, path: &Path) -> CatalogResult<Option<BoundingBox>>;
}

/// Reads footprints from files on the local storage mount.
pub struct FileFootprints;

#[async_trait]
impl FootprintProvider for FileFootprints {
    async fn footprint(&self, path: &Path) -> CatalogResult<Option<BoundingBox>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "tif" | "tiff" => {
                let path = path.to_path_buf();
                tokio::task::spawn_blocking(move || -> CatalogResult<Option<BoundingBox>> {
                    let mut file = std::fs::File::open(&path)?;
                    Ok(geotiff_bounds(&mut file))
                })
                .await
                .map_err(|e| CatalogError::InternalError(e.to_string()))?
            }
            "geojson" => {
                let data = tokio::fs::read(path).await?;
                let value: serde_json::Value = serde_json::from_slice(&data).map_err(|e| {
                    CatalogError::InvalidGeometry(format!("unparsable GeoJSON: {}", e))
                })?;
                Ok(geojson_bounds(&value))
            }
            // Shapefile/GeoPackage georeferencing is not read here.
            _ => Ok(None),
        }
    }
}

// ============================================================================
// GeoTIFF tag reading
// ============================================================================

const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;

const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_DOUBLE: u16 = 12;

const KEY_GEOGRAPHIC_TYPE: u16 = 2048;
const KEY_PROJECTED_CS_TYPE: u16 = 3072;

const EPSG_WGS84: u16 = 4326;

/// Derive WGS84 bounds from GeoTIFF georeferencing tags.
///
/// Returns `None` for anything unusable: not a classic TIFF, missing
/// scale/tiepoint tags, or a CRS other than EPSG:4326.
pub fn geotiff_bounds<R: Read + Seek>(reader: &mut R) -> Option<BoundingBox> {
    parse_geotiff(reader).ok().flatten()
}

#[derive(Debug, Clone, Copy)]
struct IfdEntry {
    tag: u16,
    type_: u16,
    count: u32,
    raw: [u8; 4],
}

fn parse_geotiff<R: Read + Seek>(r: &mut R) -> std::io::Result<Option<BoundingBox>> {
    let mut header = [0u8; 8];
    r.read_exact(&mut header)?;

    let le = match &header[0..2] {
        b"II" => true,
        b"MM" => false,
        _ => return Ok(None),
    };
    // Classic TIFF only; 43 would be BigTIFF
    if rd_u16(le, [header[2], header[3]]) != 42 {
        return Ok(None);
    }

    let ifd_offset = rd_u32(le, [header[4], header[5], header[6], header[7]]);
    r.seek(SeekFrom::Start(ifd_offset as u64))?;

    let mut count_buf = [0u8; 2];
    r.read_exact(&mut count_buf)?;
    let entry_count = rd_u16(le, count_buf);

    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        let mut buf = [0u8; 12];
        r.read_exact(&mut buf)?;
        entries.push(IfdEntry {
            tag: rd_u16(le, [buf[0], buf[1]]),
            type_: rd_u16(le, [buf[2], buf[3]]),
            count: rd_u32(le, [buf[4], buf[5], buf[6], buf[7]]),
            raw: [buf[8], buf[9], buf[10], buf[11]],
        });
    }

    let find = |tag: u16| entries.iter().copied().find(|e| e.tag == tag);

    let (Some(width), Some(height)) = (
        find(TAG_IMAGE_WIDTH).and_then(|e| entry_dimension(le, e)),
        find(TAG_IMAGE_LENGTH).and_then(|e| entry_dimension(le, e)),
    ) else {
        return Ok(None);
    };

    let scale = match find(TAG_MODEL_PIXEL_SCALE) {
        Some(e) => read_doubles(r, le, e)?,
        None => return Ok(None),
    };
    let tiepoint = match find(TAG_MODEL_TIEPOINT) {
        Some(e) => read_doubles(r, le, e)?,
        None => return Ok(None),
    };
    let geokeys = match find(TAG_GEO_KEY_DIRECTORY) {
        Some(e) => read_shorts(r, le, e)?,
        None => return Ok(None),
    };

    if epsg_from_geokeys(&geokeys) != Some(EPSG_WGS84) {
        return Ok(None);
    }
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Ok(None);
    }

    let (sx, sy) = (scale[0], scale[1]);
    if !(sx > 0.0) || !(sy > 0.0) {
        return Ok(None);
    }

    // Tiepoint maps raster position (i, j) to model position (x, y);
    // the raster origin is the top-left corner.
    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    let min_x = x - i * sx;
    let max_y = y + j * sy;
    let max_x = min_x + width as f64 * sx;
    let min_y = max_y - height as f64 * sy;

    if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
        return Ok(None);
    }

    Ok(Some(BoundingBox::new(min_x, min_y, max_x, max_y)))
}

fn entry_dimension(le: bool, entry: IfdEntry) -> Option<u32> {
    if entry.count != 1 {
        return None;
    }
    match entry.type_ {
        TYPE_SHORT => Some(rd_u16(le, [entry.raw[0], entry.raw[1]]) as u32),
        TYPE_LONG => Some(rd_u32(le, entry.raw)),
        _ => None,
    }
}

fn read_doubles<R: Read + Seek>(
    r: &mut R,
    le: bool,
    entry: IfdEntry,
) -> std::io::Result<Vec<f64>> {
    if entry.type_ != TYPE_DOUBLE {
        return Ok(Vec::new());
    }
    // count * 8 bytes never fits inline
    let offset = rd_u32(le, entry.raw);
    r.seek(SeekFrom::Start(offset as u64))?;

    let mut values = Vec::with_capacity(entry.count as usize);
    for _ in 0..entry.count {
        let mut buf = [0u8; 8];
        r.read_exact(&mut buf)?;
        values.push(if le {
            f64::from_le_bytes(buf)
        } else {
            f64::from_be_bytes(buf)
        });
    }
    Ok(values)
}

fn read_shorts<R: Read + Seek>(r: &mut R, le: bool, entry: IfdEntry) -> std::io::Result<Vec<u16>> {
    if entry.type_ != TYPE_SHORT {
        return Ok(Vec::new());
    }

    let mut data = vec![0u8; entry.count as usize * 2];
    let data_len = data.len();
    if data_len <= 4 {
        // Value stored inline, left-justified
        data.copy_from_slice(&entry.raw[..data_len]);
    } else {
        let offset = rd_u32(le, entry.raw);
        r.seek(SeekFrom::Start(offset as u64))?;
        r.read_exact(&mut data)?;
    }

    Ok(data
        .chunks_exact(2)
        .map(|c| rd_u16(le, [c[0], c[1]]))
        .collect())
}

/// Pull the CRS code out of a GeoKeyDirectory. A projected CRS key takes
/// precedence over the geographic one when both are present.
fn epsg_from_geokeys(keys: &[u16]) -> Option<u16> {
    if keys.len() < 4 {
        return None;
    }
    let count = keys[3] as usize;

    let mut geographic = None;
    let mut projected = None;
    for idx in 0..count {
        let base = 4 + idx * 4;
        if base + 3 >= keys.len() {
            break;
        }
        // Only inline values (tag location 0) are usable here
        if keys[base + 1] != 0 {
            continue;
        }
        match keys[base] {
            KEY_GEOGRAPHIC_TYPE => geographic = Some(keys[base + 3]),
            KEY_PROJECTED_CS_TYPE => projected = Some(keys[base + 3]),
            _ => {}
        }
    }

    projected.or(geographic)
}

fn rd_u16(le: bool, b: [u8; 2]) -> u16 {
    if le {
        u16::from_le_bytes(b)
    } else {
        u16::from_be_bytes(b)
    }
}

fn rd_u32(le: bool, b: [u8; 4]) -> u32 {
    if le {
        u32::from_le_bytes(b)
    } else {
        u32::from_be_bytes(b)
    }
}

// ============================================================================
// GeoJSON bounds
// ============================================================================

/// Envelope of every coordinate pair in a GeoJSON document (geometry,
/// feature, or feature collection).
pub fn geojson_bounds(value: &serde_json::Value) -> Option<BoundingBox> {
    let mut acc = None;
    walk_geojson(value, &mut acc);
    acc
}

fn walk_geojson(value: &serde_json::Value, acc: &mut Option<BoundingBox>) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(coordinates) = map.get("coordinates") {
                fold_positions(coordinates, acc);
            }
            for key in ["geometry", "geometries", "features"] {
                if let Some(nested) = map.get(key) {
                    walk_geojson(nested, acc);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                walk_geojson(item, acc);
            }
        }
        _ => {}
    }
}

fn fold_positions(value: &serde_json::Value, acc: &mut Option<BoundingBox>) {
    let serde_json::Value::Array(items) = value else {
        return;
    };

    let position = (items.len() >= 2)
        .then(|| Some((items[0].as_f64()?, items[1].as_f64()?)))
        .flatten();

    if let Some((x, y)) = position {
        let point = BoundingBox::new(x, y, x, y);
        *acc = Some(match acc {
            Some(bbox) => bbox.union(&point),
            None => point,
        });
    } else {
        for item in items {
            fold_positions(item, acc);
        }
    }
}
