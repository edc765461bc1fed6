use crate::error::PlanError;

/// Decodes a polyline5 string into `(lon, lat)` pairs: signed varint deltas,
/// base 32 with offset 63, applied to latitude then longitude accumulators
/// in 1e-5 degrees.
pub fn decode(encoded: &str) -> Result<Vec<(f64, f64)>, PlanError> {
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        let (dlat, next) = decode_delta(bytes, index)?;
        let (dlon, next) = decode_delta(bytes, next)?;
        lat += dlat;
        lon += dlon;
        index = next;
        coordinates.push((lon as f64 * 1e-5, lat as f64 * 1e-5));
    }
    Ok(coordinates)
}

fn decode_delta(bytes: &[u8], mut index: usize) -> Result<(i64, usize), PlanError> {
    let mut result: u64 = 0;
    let mut shift = 0;
    loop {
        let byte = *bytes
            .get(index)
            .ok_or_else(|| PlanError::RouteQuery("truncated polyline geometry".to_string()))?;
        if byte < 63 {
            return Err(PlanError::RouteQuery(format!(
                "invalid polyline byte {} at offset {}",
                byte, index
            )));
        }
        let chunk = (byte - 63) as u64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        index += 1;
        if chunk < 0x20 {
            break;
        }
    }
    let magnitude = (result >> 1) as i64;
    let delta = if result & 1 != 0 { -(magnitude + 1) } else { magnitude };
    Ok((delta, index))
}

/// Encodes `(lon, lat)` pairs back into polyline5; the inverse of [`decode`].
pub fn encode(coordinates: &[(f64, f64)]) -> String {
    let mut encoded = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;
    for &(lon, lat) in coordinates {
        let lat5 = (lat * 1e5).round() as i64;
        let lon5 = (lon * 1e5).round() as i64;
        encode_delta(lat5 - prev_lat, &mut encoded);
        encode_delta(lon5 - prev_lon, &mut encoded);
        prev_lat = lat5;
        prev_lon = lon5;
    }
    encoded
}

fn encode_delta(delta: i64, out: &mut String) {
    let mut value = (delta << 1) as u64;
    if delta < 0 {
        value = !value;
    }
    while value >= 0x20 {
        out.push((((value & 0x1f) | 0x20) as u8 + 63) as char);
        value >>= 5;
    }
    out.push((value as u8 + 63) as char);
}
