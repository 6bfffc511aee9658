use ember_core::Fix;

/// Parse one RMC sentence ($GPRMC / $GNRMC).
///
/// Field layout: `$__RMC,time,status,lat,N/S,lon,E/W,...` where status `A`
/// means active fix and `V` means void. Returns `None` for any other sentence
/// type and for malformed input; the caller skips and keeps reading.
pub fn parse_rmc(line: &str) -> Option<Fix> {
    let s = line.trim();
    if !(s.starts_with("$GPRMC") || s.starts_with("$GNRMC")) {
        return None;
    }
    // Checksum suffix (*hh) lives on the last field; strip it before splitting.
    let s = s.split('*').next().unwrap_or(s);
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() < 7 {
        return None;
    }

    let valid = parts[2] == "A";
    let lat = parse_deg_min(parts[3], parts[4])?;
    let lon = parse_deg_min(parts[5], parts[6])?;

    Some(Fix { lat, lon, valid })
}

// lat is ddmm.mmmm, lon is dddmm.mmmm; hemisphere S/W negates.
fn parse_deg_min(v: &str, hemi: &str) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let dot = v.find('.')?;
    let deg_len = if dot > 4 { 3 } else { 2 };
    // get() instead of indexing: a multibyte character at the cut must be a
    // parse failure, not a panic.
    let deg: f64 = v.get(..deg_len)?.parse().ok()?;
    let min: f64 = v.get(deg_len..)?.parse().ok()?;
    let mut out = deg + (min / 60.0);
    if hemi == "S" || hemi == "W" {
        out = -out;
    }
    Some(out)
}
