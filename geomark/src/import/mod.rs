//! Normalization of GeoJSON and KML files into a [`FeatureCollection`].

pub mod geojson;
pub mod kml;

use std::fmt;
use std::path::Path;

use crate::feature::{FeatureCollection, InvalidGeometry};

/// Vector formats which can be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    GeoJson,
    Kml,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::GeoJson => "GeoJSON",
            SourceFormat::Kml => "KML",
        })
    }
}

impl SourceFormat {
    /// Pick the format by the (case-insensitive) file extension.
    pub fn from_filename(filename: &str) -> Result<Self, ImportError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("geojson") => Ok(SourceFormat::GeoJson),
            Some("kml") => Ok(SourceFormat::Kml),
            _ => Err(ImportError::UnsupportedFormat(filename.to_owned())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    /// The text is not valid for its format.
    #[error("malformed {format}: {message}")]
    Parse {
        format: SourceFormat,
        message: String,
    },

    /// The extension is not recognized, or names a format which is not supported (e.g. raster).
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The file parsed, but one of its geometries is degenerate.
    #[error("invalid geometry in {format} feature {feature}: {source}")]
    InvalidGeometry {
        format: SourceFormat,
        feature: String,
        source: InvalidGeometry,
    },
}

/// Parse `text` according to the extension of `filename`.
///
/// # Errors
///
/// [`ImportError::UnsupportedFormat`] is returned before any parsing is attempted, when the
/// extension is not one of `.geojson` or `.kml`.
pub fn normalize(
    text: &str,
    filename: &str,
) -> Result<(SourceFormat, FeatureCollection), ImportError> {
    let format = SourceFormat::from_filename(filename)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let features = match format {
        SourceFormat::GeoJson => geojson::parse(text)?,
        SourceFormat::Kml => kml::parse(text)?,
    };
    log::debug!("Normalized {} features from {filename}.", features.len());
    Ok((format, features))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_picked_by_extension() {
        assert_eq!(Ok(SourceFormat::GeoJson), SourceFormat::from_filename("parks.geojson"));
        assert_eq!(Ok(SourceFormat::Kml), SourceFormat::from_filename("trails.KML"));
        assert_eq!(
            Ok(SourceFormat::Kml),
            SourceFormat::from_filename("/home/user/Downloads/Poland.kml")
        );
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        for filename in ["ortho.tiff", "ortho.tif", "notes.txt", "geojson", "archive.kmz"] {
            assert_eq!(
                Err(ImportError::UnsupportedFormat(filename.to_owned())),
                SourceFormat::from_filename(filename)
            );
        }
    }

    #[test]
    fn unsupported_format_is_reported_before_parsing() {
        // Valid GeoJSON, but the extension decides.
        let text = r#"{"type": "FeatureCollection", "features": []}"#;
        assert_eq!(
            Err(ImportError::UnsupportedFormat("data.json".to_owned())),
            normalize(text, "data.json")
        );
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let geojson = "\u{feff}{\"type\": \"Point\", \"coordinates\": [19.94, 50.06]}";
        let (format, features) = normalize(geojson, "krakow.geojson").unwrap();
        assert_eq!(SourceFormat::GeoJson, format);
        assert_eq!(1, features.len());

        let kml = concat!(
            "\u{feff}<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<kml xmlns=\"http://www.opengis.net/kml/2.2\"><Placemark>",
            "<name>Wawel</name><Point><coordinates>19.935,50.054</coordinates></Point>",
            "</Placemark></kml>"
        );
        let (format, features) = normalize(kml, "wawel.kml").unwrap();
        assert_eq!(SourceFormat::Kml, format);
        assert_eq!(1, features.len());
        assert_eq!(Some("Wawel"), features.features()[0].name());
    }

    #[test]
    fn parse_errors_name_the_format() {
        let error = normalize("{ not json", "broken.geojson").unwrap_err();
        assert!(matches!(
            error,
            ImportError::Parse {
                format: SourceFormat::GeoJson,
                ..
            }
        ));
        assert!(error.to_string().starts_with("malformed GeoJSON"));
    }
}
