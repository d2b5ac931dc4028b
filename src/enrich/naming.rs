//! Names of the columns derived from a geocoded source column.

/// Which half of a coordinate pair a derived column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSuffix {
    Latitude,
    Longitude,
}

impl CoordinateSuffix {
    pub const ALL: [CoordinateSuffix; 2] = [CoordinateSuffix::Latitude, CoordinateSuffix::Longitude];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinateSuffix::Latitude => "LATITUDE",
            CoordinateSuffix::Longitude => "LONGITUDE",
        }
    }
}

impl std::fmt::Display for CoordinateSuffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `"{base} LATITUDE"` / `"{base} LONGITUDE"`
pub fn derived_column(base: &str, suffix: CoordinateSuffix) -> String {
    format!("{} {}", base, suffix)
}

/// Raw `"(lat, lon)"` text column for `base`
pub fn coordinates_column(base: &str) -> String {
    format!("{} COORDINATES", base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::normalize_column_name;

    #[test]
    fn test_derived_names() {
        assert_eq!(
            derived_column("Birth place", CoordinateSuffix::Latitude),
            "Birth place LATITUDE"
        );
        assert_eq!(
            derived_column("Address", CoordinateSuffix::Longitude),
            "Address LONGITUDE"
        );
        assert_eq!(coordinates_column("Address"), "Address COORDINATES");
    }

    #[test]
    fn test_normalized_derived_name() {
        let name = derived_column("Burial place", CoordinateSuffix::Longitude);
        assert_eq!(normalize_column_name(&name), "BURIAL_PLACE_LONGITUDE");
    }
}
