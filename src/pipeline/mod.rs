//! Training and inference compositions.
//!
//! Both pipelines take their steps from the same [`FeatureSchema`] through
//! the builders below and finish by selecting
//! [`FeatureSchema::feature_names`], so a listing run through either one
//! produces the same columns in the same order.
//!
//! | Stage | Training | Inference |
//! |-------|----------|-----------|
//! | input | raw CSV rows (all text) | [`ListingForm`](crate::form::ListingForm) |
//! | coordinates | dataset columns | geocoded address |
//! | single labels | every table | only fields served as labels |
//! | compound / appliances | split from the raw text | yes/no answers per target |
//! | size | cleaned and group-mean imputed | taken from the form |

pub mod inference;
pub mod table;
pub mod training;

pub use inference::InferencePipeline;
pub use table::{FeatureManifest, FeatureTable, Target};
pub use training::TrainingPipeline;

use crate::dataset::Frame;
use crate::error::FeatureError;
use crate::preprocessing::{
    AppliancesExpander, CategoricalEncoder, ColumnSum, CompoundSplitter, DistanceFeatureSet,
    FeatureStep,
};
use crate::schema::{ColumnEncoding, FeatureSchema, ServingInput};
use tracing::debug;

/// Which side of the train/serve boundary a step list is built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Training,
    Serving,
}

type Steps = Vec<Box<dyn FeatureStep>>;

/// Encoders for single-valued label columns.
///
/// At serving time, fields answered with a number are already numeric and
/// get no encoder.
pub(crate) fn single_encoders(schema: &FeatureSchema, stage: Stage) -> Steps {
    schema
        .encodings
        .iter()
        .filter_map(|encoding| match encoding {
            ColumnEncoding::Single {
                column,
                table,
                serving,
            } => {
                let encode = stage == Stage::Training || *serving == ServingInput::Label;
                encode.then(|| {
                    Box::new(CategoricalEncoder::new(column.as_str(), table.clone()))
                        as Box<dyn FeatureStep>
                })
            }
            _ => None,
        })
        .collect()
}

pub(crate) fn derived_sums(schema: &FeatureSchema) -> Steps {
    schema
        .derived_sums
        .iter()
        .map(|sum| Box::new(ColumnSum::from_spec(sum)) as Box<dyn FeatureStep>)
        .collect()
}

/// Steps producing the compound targets and appliance flags.
///
/// Training splits the raw text; serving receives each target as a separate
/// yes/no answer and encodes it with the schema's answer table.
pub(crate) fn multi_column_encoders(
    schema: &FeatureSchema,
    stage: Stage,
) -> Result<Steps, FeatureError> {
    let mut steps: Steps = Vec::new();
    for encoding in &schema.encodings {
        match (encoding, stage) {
            (ColumnEncoding::Single { .. }, _) => {}
            (
                ColumnEncoding::Compound {
                    source,
                    targets,
                    table,
                },
                Stage::Training,
            ) => steps.push(Box::new(CompoundSplitter::new(
                source.as_str(),
                targets.clone(),
                table.clone(),
            )?)),
            (ColumnEncoding::Appliances { source, known }, Stage::Training) => {
                steps.push(Box::new(AppliancesExpander::new(source.as_str(), known.clone())))
            }
            (other, Stage::Serving) => {
                for output in other.outputs() {
                    steps.push(Box::new(CategoricalEncoder::new(
                        output,
                        schema.answers.clone(),
                    )));
                }
            }
        }
    }
    Ok(steps)
}

pub(crate) fn distance_features(schema: &FeatureSchema) -> DistanceFeatureSet {
    DistanceFeatureSet::new(
        schema.latitude.as_str(),
        schema.longitude.as_str(),
        schema.landmarks.clone(),
    )
}

/// Apply `steps` in order.
pub(crate) fn run_steps(steps: &[Box<dyn FeatureStep>], frame: &mut Frame) -> Result<(), FeatureError> {
    for step in steps {
        run_step(step.as_ref(), frame)?;
    }
    Ok(())
}

pub(crate) fn run_step(step: &dyn FeatureStep, frame: &mut Frame) -> Result<(), FeatureError> {
    step.apply(frame)?;
    debug!(
        step = step.step_name(),
        rows = frame.n_rows(),
        columns = frame.n_columns(),
        "applied step"
    );
    Ok(())
}
