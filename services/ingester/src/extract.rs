//! Path metadata extraction.
//!
//! Asset filenames follow the `<year>_<region>[_<zone>]_cog.<ext>` naming
//! convention. Extraction is pure: identical input yields identical output on
//! every platform, for both `/` and `\` path separators.

use stac_common::{CatalogError, CatalogResult};

/// Structured attributes derived from an asset filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMetadata {
    pub year: i32,

    /// Case preserved as written in the filename.
    pub region: String,

    /// Empty string when the filename carries no zone token.
    pub zone: String,

    /// Reserved filename field; captured from the 4-token form but assigned
    /// no semantics anywhere downstream.
    pub project: Option<String>,
}

/// Parse the final segment of `path` against the naming convention.
///
/// `2023_Asan_B_cog.tif` → year 2023, region "Asan", zone "B".
/// `2022_Gamcho_cog.tif` → year 2022, region "Gamcho", zone "".
pub fn extract(path: &str) -> CatalogResult<PathMetadata> {
    let filename = path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path);

    let mismatch = || CatalogError::PatternMismatch(filename.to_string());

    let stem = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => stem,
        _ => return Err(mismatch()),
    };

    let tokens: Vec<&str> = stem.split('_').collect();
    if tokens.len() < 3 || tokens[tokens.len() - 1] != "cog" {
        return Err(mismatch());
    }

    let year_token = tokens[0];
    if year_token.len() != 4 || !year_token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(mismatch());
    }
    let year: i32 = year_token.parse().map_err(|_| mismatch())?;

    let middle = &tokens[1..tokens.len() - 1];
    if middle.iter().any(|t| t.is_empty()) {
        return Err(mismatch());
    }

    let (region, zone, project) = match middle {
        [region] => (region.to_string(), String::new(), None),
        [region, zone] => (region.to_string(), zone.to_string(), None),
        [region, zone, project] => (
            region.to_string(),
            zone.to_string(),
            Some(project.to_string()),
        ),
        _ => return Err(mismatch()),
    };

    Ok(PathMetadata {
        year,
        region,
        zone,
        project,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_zone() {
        let meta = extract("/nas/2023/2023_Asan_B_cog.tif").unwrap();
        assert_eq!(meta.year, 2023);
        assert_eq!(meta.region, "Asan");
        assert_eq!(meta.zone, "B");
        assert_eq!(meta.project, None);
    }

    #[test]
    fn test_without_zone() {
        let meta = extract("2022_Gamcho_cog.tif").unwrap();
        assert_eq!(meta.year, 2022);
        assert_eq!(meta.region, "Gamcho");
        assert_eq!(meta.zone, "");
    }

    #[test]
    fn test_reserved_project_token() {
        let meta = extract("2023_Asan_B_p17_cog.tif").unwrap();
        assert_eq!(meta.region, "Asan");
        assert_eq!(meta.zone, "B");
        assert_eq!(meta.project.as_deref(), Some("p17"));
    }

    #[test]
    fn test_backslash_separators() {
        let forward = extract("nas/2023/2023_Asan_B_cog.tif").unwrap();
        let backward = extract(r"nas\2023\2023_Asan_B_cog.tif").unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_case_preserved() {
        let meta = extract("2023_aSaN_b_cog.tif").unwrap();
        assert_eq!(meta.region, "aSaN");
        assert_eq!(meta.zone, "b");
    }

    #[test]
    fn test_determinism() {
        let a = extract("2023_Asan_B_cog.tif").unwrap();
        let b = extract("2023_Asan_B_cog.tif").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mismatches() {
        // Missing cog marker
        assert!(extract("2023_Asan_B.tif").is_err());
        // Year not 4 digits
        assert!(extract("23_Asan_cog.tif").is_err());
        assert!(extract("202x_Asan_cog.tif").is_err());
        // No region token
        assert!(extract("2023_cog.tif").is_err());
        // Too many tokens between region and cog
        assert!(extract("2023_a_b_c_d_cog.tif").is_err());
        // Empty token from a double underscore
        assert!(extract("2023__B_cog.tif").is_err());
        // No extension
        assert!(extract("2023_Asan_cog").is_err());
        // Unrelated file
        assert!(extract("readme.txt").is_err());
    }
}
