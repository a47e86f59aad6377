//! Batch feature derivation over the raw listings dataset.

use super::{
    derived_sums, distance_features, multi_column_encoders, run_step, run_steps, single_encoders,
    FeatureTable, Stage, Target,
};
use crate::dataset::Frame;
use crate::error::FeatureError;
use crate::preprocessing::{RowFilter, SizeImputer};
use crate::schema::FeatureSchema;
use std::sync::Arc;
use tracing::{debug, info};

/// Raw listings in, model-ready feature table (with target) out.
///
/// Order: check raw columns, prune, coerce target and coordinates, filter
/// rows, encode single labels, derive sums, impute sizes, split compound
/// columns and appliances, add landmark distances, select schema columns.
#[derive(Clone, Debug)]
pub struct TrainingPipeline {
    schema: Arc<FeatureSchema>,
}

impl TrainingPipeline {
    /// # Errors
    /// Returns the schema's validation error, if any.
    pub fn new(schema: Arc<FeatureSchema>) -> Result<Self, FeatureError> {
        schema.validate()?;
        Ok(Self { schema })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn run(&self, raw: Frame) -> Result<FeatureTable, FeatureError> {
        let schema = &self.schema;
        let rows_in = raw.n_rows();
        let mut frame = raw;

        frame.require_columns(&schema.required_raw_columns())?;
        let pruned = frame.drop_columns(&schema.pruned_raw_columns);
        debug!(pruned, "dropped unused raw columns");

        frame.coerce_numeric(&schema.target)?;
        frame.coerce_numeric(&schema.latitude)?;
        frame.coerce_numeric(&schema.longitude)?;

        let filter = RowFilter::from_spec(&schema.row_filter, &schema.target)?;
        run_step(&filter, &mut frame)?;
        if frame.n_rows() == 0 {
            return Err(FeatureError::EmptyData(format!(
                "no listings left after filtering {} rows",
                rows_in
            )));
        }

        run_steps(&single_encoders(schema, Stage::Training), &mut frame)?;
        run_steps(&derived_sums(schema), &mut frame)?;

        run_step(&SizeImputer::from_spec(&schema.size), &mut frame)?;

        run_steps(&multi_column_encoders(schema, Stage::Training)?, &mut frame)?;
        run_step(&distance_features(schema), &mut frame)?;

        let target = Target {
            name: schema.target.clone(),
            values: frame.numeric(&schema.target)?.to_vec(),
        };
        let features = frame.select(&schema.feature_names())?;
        let table = FeatureTable::new(schema.feature_columns(), features, Some(target))?;

        info!(
            rows_in,
            rows_out = table.n_rows(),
            columns = table.column_names().len(),
            "built training features"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_raw_csv;

    const HEADER: &str = "Unnamed: 0,Address,Title,Price($),Building Type,Bedrooms,Bathrooms,\
Parking Included,Furnished,Air Conditioning,Smoking Permitted,Pet Friendly,Wi-Fi and More,\
Personal Outdoor Space,Utilities,Appliances,Size (sqft),latitude,longitude";

    fn raw(rows: &[&str]) -> Frame {
        let mut data = String::from(HEADER);
        for row in rows {
            data.push('\n');
            data.push_str(row);
        }
        read_raw_csv(data.as_bytes()).unwrap()
    }

    fn pipeline() -> TrainingPipeline {
        TrainingPipeline::new(Arc::new(FeatureSchema::toronto())).unwrap()
    }

    #[test]
    fn test_training_end_to_end() {
        let frame = raw(&[
            "0,1 Yonge St,Nice,2200,Condo,1 + Den,1,1,No,Yes,No,Limited,Internet,Balcony,\
\"Hydro_Yes,Heat_Yes,Water_Yes\",Fridge / FreezerDishwasher,\"1,050\",43.6426,-79.3871",
            "1,2 Bay St,Ok,2600,Apartment,2,1,0,Yes,No,Outdoors only,Yes,Not Included,Yard,,,\
Not Available,43.65,-79.38",
            "2,3 King St,Cheap,800,Apartment,1,1,0,No,No,No,No,Not Included,Not Included,,,500,43.6,-79.4",
            "3,4 Queen St,Gone,2100,Apartment,,1,0,No,No,No,No,Not Included,Not Included,,,600,43.6,-79.4",
        ]);
        let table = pipeline().run(frame).unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column_names(), FeatureSchema::toronto().feature_names().as_slice());
        assert_eq!(table.target().unwrap().values, vec![2200.0, 2600.0]);

        let features = table.features();
        assert_eq!(features.numeric("Bedrooms").unwrap(), &[1.5, 2.0]);
        assert_eq!(features.numeric("Rooms").unwrap(), &[2.5, 3.0]);
        assert_eq!(features.numeric("Smoking Permitted").unwrap(), &[0.0, 0.5]);
        assert_eq!(features.numeric("Internet").unwrap(), &[1.0, 0.0]);
        assert_eq!(features.numeric("Yard").unwrap(), &[0.0, 1.0]);
        assert_eq!(features.numeric("Hydro").unwrap()[0], 1.0);
        assert!(features.numeric("Hydro").unwrap()[1].is_nan());
        assert_eq!(features.numeric("Fridge / Freezer").unwrap(), &[1.0, 0.0]);
        assert_eq!(features.numeric("Dishwasher").unwrap(), &[1.0, 0.0]);
        assert_eq!(features.numeric("Size (sqft)").unwrap()[0], 1050.0);
        // Rooms 3.0 has no known size in this batch
        assert!(features.numeric("Size (sqft)").unwrap()[1].is_nan());

        let downtown = features.numeric("distance to downtown (km)").unwrap();
        assert!(downtown[0].abs() < 1e-9);
        assert!(downtown[1] > 0.0);
        assert_eq!(
            table.categorical("Building Type").unwrap(),
            &[Some("Condo".to_string()), Some("Apartment".to_string())]
        );
    }

    #[test]
    fn test_training_missing_raw_column() {
        let frame = read_raw_csv("Price($),Bedrooms\n2000,1\n".as_bytes()).unwrap();
        let result = pipeline().run(frame);
        assert!(matches!(result, Err(FeatureError::MissingColumn(_))));
    }

    #[test]
    fn test_training_everything_filtered() {
        let frame = raw(&[
            "0,a,t,900,Condo,1,1,0,No,No,No,No,Not Included,Not Included,,,500,43.6,-79.4",
        ]);
        let result = pipeline().run(frame);
        assert!(matches!(result, Err(FeatureError::EmptyData(_))));
    }

    #[test]
    fn test_training_bad_size_is_fatal() {
        let frame = raw(&[
            "0,a,t,2000,Condo,1,1,0,No,No,No,No,Not Included,Not Included,,,huge,43.6,-79.4",
        ]);
        let result = pipeline().run(frame);
        assert!(matches!(result, Err(FeatureError::InvalidNumber { .. })));
    }

    #[test]
    fn test_training_rejects_inputs_produced_too_late() {
        let mut late_sum = FeatureSchema::toronto();
        late_sum.derived_sums.push(crate::schema::DerivedSum {
            name: "Utilities Included".to_string(),
            left: "Hydro".to_string(),
            right: "Heat".to_string(),
        });
        assert!(TrainingPipeline::new(Arc::new(late_sum)).is_err());

        let mut late_group = FeatureSchema::toronto();
        late_group.size.group_by = "Hydro".to_string();
        assert!(TrainingPipeline::new(Arc::new(late_group)).is_err());
    }
}
