//! Single-listing feature derivation at serving time.

use super::{
    derived_sums, distance_features, multi_column_encoders, run_step, run_steps, single_encoders,
    FeatureManifest, FeatureTable, Stage,
};
use crate::config::PipelineConfig;
use crate::dataset::Column;
use crate::error::FeatureError;
use crate::form::ListingForm;
use crate::geocoding::{Coordinates, FixedGeocoder, Geocoder, PhotonGeocoder, RateLimitedGeocoder};
use crate::schema::FeatureSchema;
use std::sync::Arc;
use tracing::info;

/// One listing form in, one-row feature table out.
///
/// The address is geocoded, then replaced by coordinates and landmark
/// distances. A failed geocode leaves coordinates and distances missing;
/// it is never an error.
pub struct InferencePipeline<G> {
    schema: Arc<FeatureSchema>,
    geocoder: RateLimitedGeocoder<G>,
    manifest: Option<FeatureManifest>,
}

impl InferencePipeline<Box<dyn Geocoder>> {
    /// Pipeline built from `config`.
    ///
    /// With `fixed` coordinates no geocoding request is made; otherwise the
    /// Photon client described by `config.geocoder` is used.
    pub fn from_config(
        config: &PipelineConfig,
        fixed: Option<Coordinates>,
    ) -> Result<Self, FeatureError> {
        let settings = &config.geocoder;
        let inner: Box<dyn Geocoder> = match fixed {
            Some(coordinates) => Box::new(FixedGeocoder(Some(coordinates))),
            None => Box::new(
                PhotonGeocoder::with_settings(
                    &settings.base_url,
                    &settings.user_agent,
                    settings.timeout(),
                )
                .map_err(|e| FeatureError::InvalidParameter(e.to_string()))?,
            ),
        };
        let geocoder = RateLimitedGeocoder::new(inner)
            .with_request_pause(settings.request_pause())
            .with_backoff_pause(settings.backoff_pause());
        Self::new(Arc::new(config.schema.clone()), geocoder)
    }
}

impl<G: Geocoder> InferencePipeline<G> {
    pub fn new(
        schema: Arc<FeatureSchema>,
        geocoder: RateLimitedGeocoder<G>,
    ) -> Result<Self, FeatureError> {
        schema.validate()?;
        Ok(Self {
            schema,
            geocoder,
            manifest: None,
        })
    }

    /// Check every output against a training-time manifest.
    pub fn with_manifest(mut self, manifest: FeatureManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn run(&self, form: &ListingForm) -> Result<FeatureTable, FeatureError> {
        let schema = &self.schema;
        let mut frame = form.to_frame(schema)?;

        let address = frame
            .text(&schema.address_field)?
            .first()
            .cloned()
            .flatten()
            .unwrap_or_default();
        let coordinates = self.geocoder.locate(&address);
        frame.remove_column(&schema.address_field)?;
        frame.add_column(
            schema.latitude.as_str(),
            Column::Numeric(vec![coordinates.latitude]),
        )?;
        frame.add_column(
            schema.longitude.as_str(),
            Column::Numeric(vec![coordinates.longitude]),
        )?;
        run_step(&distance_features(schema), &mut frame)?;

        run_steps(&single_encoders(schema, Stage::Serving), &mut frame)?;
        run_steps(&derived_sums(schema), &mut frame)?;
        run_steps(&multi_column_encoders(schema, Stage::Serving)?, &mut frame)?;

        let features = frame.select(&schema.feature_names())?;
        let table = FeatureTable::new(schema.feature_columns(), features, None)?;
        if let Some(manifest) = &self.manifest {
            manifest.verify(&table)?;
        }

        info!(
            geocoded = !coordinates.is_missing(),
            columns = table.column_names().len(),
            "built serving features"
        );
        Ok(table)
    }
}
