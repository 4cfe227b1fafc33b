//! Content extraction from the remote index page
//!
//! [`LinkExtractor`] finds the country extract among the page's anchors and
//! resolves it to an absolute URL. [`DateExtractor`] finds the timestamp the
//! page prints next to the extract, which is the only signal used to decide
//! whether the remote file has changed.

use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use url::Url;

use crate::app::models::ChangeMarker;
use crate::constants::source;
use crate::errors::{ExtractError, ExtractResult};

/// Locates the `<country>-latest*.(osm|pbf)` anchor in an index page
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    country: String,
    pattern: Regex,
    anchors: Selector,
}

impl LinkExtractor {
    /// Creates an extractor for one country
    ///
    /// The country is matched literally and case-insensitively; the href
    /// must end in `.osm` or `.pbf`.
    pub fn new(country: impl Into<String>) -> ExtractResult<Self> {
        let country = country.into();
        let raw_pattern = format!(r"{}-latest.*\.(osm|pbf)$", regex::escape(&country));
        let pattern = RegexBuilder::new(&raw_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ExtractError::InvalidPattern {
                pattern: raw_pattern.clone(),
                error: e.to_string(),
            })?;
        let anchors = Selector::parse(source::ANCHOR_SELECTOR).map_err(|e| {
            ExtractError::InvalidPattern {
                pattern: source::ANCHOR_SELECTOR.to_string(),
                error: e.to_string(),
            }
        })?;

        Ok(Self {
            country,
            pattern,
            anchors,
        })
    }

    /// Country this extractor looks for
    pub fn country(&self) -> &str {
        &self.country
    }

    /// Returns the first matching href resolved against `base_url`
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::LinkNotFound` when no anchor matches and
    /// `ExtractError::InvalidUrl` when the href cannot be resolved.
    pub fn extract(&self, html: &str, base_url: &Url) -> ExtractResult<Url> {
        let document = Html::parse_document(html);

        let href = document
            .select(&self.anchors)
            .filter_map(|element| element.value().attr("href"))
            .find(|href| self.pattern.is_match(href))
            .ok_or_else(|| ExtractError::LinkNotFound {
                country: self.country.clone(),
            })?;

        let resolved = base_url.join(href).map_err(|e| ExtractError::InvalidUrl {
            base: base_url.to_string(),
            href: href.to_string(),
            error: e.to_string(),
        })?;

        tracing::debug!("Resolved download link {} -> {}", href, resolved);
        Ok(resolved)
    }
}

/// Finds the first `YYYY-MM-DDTHH:MM:SSZ` timestamp in a page's text
#[derive(Debug, Clone)]
pub struct DateExtractor {
    pattern: Regex,
}

impl DateExtractor {
    pub fn new() -> ExtractResult<Self> {
        let pattern =
            Regex::new(source::MARKER_PATTERN).map_err(|e| ExtractError::InvalidPattern {
                pattern: source::MARKER_PATTERN.to_string(),
                error: e.to_string(),
            })?;
        Ok(Self { pattern })
    }

    /// Returns the first timestamp in the rendered text, verbatim
    ///
    /// Markup is stripped first, so timestamps inside attribute values are
    /// not considered.
    pub fn extract(&self, html: &str) -> ExtractResult<ChangeMarker> {
        let document = Html::parse_document(html);
        let text: String = document.root_element().text().collect();

        self.pattern
            .find(&text)
            .map(|found| ChangeMarker::new(found.as_str()))
            .ok_or(ExtractError::MarkerNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://download.geofabrik.de/south-america/brazil.html";

    fn base_url() -> Url {
        Url::parse(BASE).unwrap()
    }

    #[test]
    fn test_relative_link_resolved_against_base() {
        let html = r#"
            <html><body>
                <a href="brazil.html">Brazil</a>
                <a href="brazil-latest.osm.pbf">brazil-latest.osm.pbf</a>
            </body></html>
        "#;

        let extractor = LinkExtractor::new("brazil").unwrap();
        let url = extractor.extract(html, &base_url()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://download.geofabrik.de/south-america/brazil-latest.osm.pbf"
        );
    }

    #[test]
    fn test_first_matching_anchor_wins() {
        let html = r#"
            <a href="/south-america/brazil-latest-free.shp.zip">shapefile</a>
            <a href="brazil-latest.osm.bz2">bz2</a>
            <a href="https://mirror.example.org/brazil-latest.osm.pbf">mirror</a>
            <a href="brazil-latest.osm">xml</a>
        "#;

        let extractor = LinkExtractor::new("brazil").unwrap();
        let url = extractor.extract(html, &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://mirror.example.org/brazil-latest.osm.pbf");
    }

    #[test]
    fn test_link_match_is_case_insensitive() {
        let html = r#"<a href="Brazil-Latest.OSM.PBF">upper</a>"#;

        let extractor = LinkExtractor::new("brazil").unwrap();
        let url = extractor.extract(html, &base_url()).unwrap();
        assert!(url.as_str().ends_with("/south-america/Brazil-Latest.OSM.PBF"));
    }

    #[test]
    fn test_missing_link_is_link_not_found() {
        let html = r#"<a href="argentina-latest.osm.pbf">other country</a>"#;

        let extractor = LinkExtractor::new("brazil").unwrap();
        let result = extractor.extract(html, &base_url());
        match result {
            Err(ExtractError::LinkNotFound { country }) => assert_eq!(country, "brazil"),
            other => panic!("Expected LinkNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_country_is_matched_literally() {
        // A regex metacharacter in the country must not widen the match
        let html = r#"<a href="bXazil-latest.osm.pbf">typo</a>"#;

        let extractor = LinkExtractor::new("b.azil").unwrap();
        assert!(extractor.extract(html, &base_url()).is_err());
    }

    #[test]
    fn test_marker_extracted_verbatim() {
        let html = r#"
            <html><body>
                <p>This file was last modified 2024-05-01T20:21:02Z and contains all OSM data.</p>
            </body></html>
        "#;

        let marker = DateExtractor::new().unwrap().extract(html).unwrap();
        assert_eq!(marker.as_str(), "2024-05-01T20:21:02Z");
    }

    #[test]
    fn test_first_marker_wins() {
        let html = r#"
            <li>brazil-latest.osm.pbf, 2024-05-01T20:21:02Z</li>
            <li>brazil-internal.osh.pbf, 2024-04-30T08:00:00Z</li>
        "#;

        let marker = DateExtractor::new().unwrap().extract(html).unwrap();
        assert_eq!(marker.as_str(), "2024-05-01T20:21:02Z");
    }

    #[test]
    fn test_marker_in_attribute_is_ignored() {
        let html = r#"<time datetime="2024-05-01T20:21:02Z">yesterday</time>"#;

        let result = DateExtractor::new().unwrap().extract(html);
        assert!(matches!(result, Err(ExtractError::MarkerNotFound)));
    }

    #[test]
    fn test_missing_marker_is_error() {
        let html = "<p>Last modified 2024-05-01 20:21</p>";

        let result = DateExtractor::new().unwrap().extract(html);
        assert!(matches!(result, Err(ExtractError::MarkerNotFound)));
    }
}
