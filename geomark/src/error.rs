use crate::{
    feature::{FeatureId, InvalidGeometry},
    import::ImportError,
    layers::LayerId,
    store::MarkerId,
    zoom::InvalidZoom,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Import(#[from] ImportError),

    /// An action arrived before [`crate::Engine::load`].
    #[error("map session is not initialized yet")]
    UninitializedSession,

    #[error(transparent)]
    InvalidZoom(#[from] InvalidZoom),

    /// A feature handed over by the host or the drawing plugin is degenerate.
    #[error("invalid geometry of feature {id}: {source}")]
    InvalidFeature {
        id: FeatureId,
        source: InvalidGeometry,
    },

    #[error("unknown layer: {0}")]
    UnknownLayer(LayerId),

    #[error("unknown marker: {0}")]
    UnknownMarker(MarkerId),

    /// Another file is being imported.
    #[error("import of {0} is still in progress")]
    ImportInProgress(String),

    #[error("could not read {filename}: {source}")]
    Read {
        filename: String,
        source: std::io::Error,
    },

    #[error("invalid options: {0}")]
    Options(#[from] serde_json::Error),
}
