use charon_routing::GeoPoint;
use jiff::SpanRelativeTo;

pub fn parse_geopoint(input: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = input
        .split_once(',')
        .ok_or_else(|| String::from("Expected \"lat,lng\""))?;

    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid latitude: {lat}"))?;
    let lng = lng
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid longitude: {lng}"))?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("Latitude out of range: {lat}"));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(format!("Longitude out of range: {lng}"));
    }

    Ok(GeoPoint::new(lat, lng))
}

pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_secs(seconds.abs()));
    }

    Err(String::from("Invalid duration"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lng_pairs() {
        let point = parse_geopoint("14.5995, 120.9842").unwrap();
        assert_eq!(point.lat, 14.5995);
        assert_eq!(point.lng, 120.9842);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(parse_geopoint("91.0,0.0").is_err());
        assert!(parse_geopoint("0.0,181.0").is_err());
        assert!(parse_geopoint("not a point").is_err());
    }

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("2s").unwrap(), jiff::SignedDuration::from_secs(2));
        assert_eq!(parse_duration("5").unwrap(), jiff::SignedDuration::from_secs(5));
        assert!(parse_duration("soon").is_err());
    }
}
