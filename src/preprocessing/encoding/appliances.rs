//! Presence flags from a free-text appliance inventory.

use crate::dataset::{Column, Frame};
use crate::error::FeatureError;
use crate::preprocessing::traits::FeatureStep;

/// Expands an inventory string into one 0/1 column per known appliance.
///
/// The inventory is the appliance names concatenated without a reliable
/// delimiter (e.g. `"Fridge / FreezerDishwasher"`), so presence is decided by
/// substring search. A name that is itself a substring of another name will
/// produce false positives; none of the default names overlap. Missing text
/// counts as "no appliances", never as missing flags. The source column is
/// removed.
#[derive(Clone, Debug)]
pub struct AppliancesExpander {
    source: String,
    known: Vec<String>,
}

impl AppliancesExpander {
    pub fn new(source: impl Into<String>, known: Vec<String>) -> Self {
        Self {
            source: source.into(),
            known,
        }
    }

    /// Flags for a single inventory string, one per known appliance.
    pub fn flags(&self, inventory: Option<&str>) -> Vec<f64> {
        let text = inventory.unwrap_or("");
        self.known
            .iter()
            .map(|name| if text.contains(name.as_str()) { 1.0 } else { 0.0 })
            .collect()
    }
}

impl FeatureStep for AppliancesExpander {
    fn step_name(&self) -> &'static str {
        "AppliancesExpander"
    }

    fn apply(&self, frame: &mut Frame) -> Result<(), FeatureError> {
        frame.require_absent(&self.known)?;
        let inventories = frame.text(&self.source)?;
        let mut columns = vec![Vec::with_capacity(inventories.len()); self.known.len()];
        for inventory in inventories {
            for (column, flag) in columns.iter_mut().zip(self.flags(inventory.as_deref())) {
                column.push(flag);
            }
        }

        for (name, values) in self.known.iter().zip(columns) {
            frame.add_column(name.as_str(), Column::Numeric(values))?;
        }
        frame.remove_column(&self.source)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expander(known: &[&str]) -> AppliancesExpander {
        AppliancesExpander::new("Appliances", known.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_appliances_flags() {
        let expander = expander(&["Fridge / Freezer", "Dishwasher", "Laundry (In Unit)"]);
        assert_eq!(
            expander.flags(Some("Fridge / FreezerDishwasher")),
            vec![1.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_appliances_missing_text_is_no_appliances() {
        let expander = expander(&["Fridge / Freezer", "Dishwasher", "Laundry (In Unit)"]);
        assert_eq!(expander.flags(None), vec![0.0, 0.0, 0.0]);
        assert_eq!(expander.flags(Some("")), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_appliances_substring_overlap_is_kept() {
        // Known limitation: "Laundry" matches inside "Laundry (In Unit)"
        let expander = expander(&["Laundry", "Laundry (In Unit)"]);
        assert_eq!(expander.flags(Some("Laundry (In Unit)")), vec![1.0, 1.0]);
    }

    #[test]
    fn test_appliances_apply() {
        let mut frame = Frame::from_columns([(
            "Appliances",
            Column::Text(vec![
                Some("Laundry (In Building)Dishwasher".to_string()),
                None,
            ]),
        )])
        .unwrap();
        expander(&["Laundry (In Building)", "Dishwasher"])
            .apply(&mut frame)
            .unwrap();

        assert!(!frame.contains("Appliances"));
        assert_eq!(frame.numeric("Laundry (In Building)").unwrap(), &[1.0, 0.0]);
        assert_eq!(frame.numeric("Dishwasher").unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn test_appliances_collision_leaves_frame_unchanged() {
        let mut frame = Frame::from_columns([
            ("Appliances", Column::Text(vec![Some("Dishwasher".to_string())])),
            ("Dishwasher", Column::Numeric(vec![1.0])),
        ])
        .unwrap();
        let result = expander(&["Fridge / Freezer", "Dishwasher"]).apply(&mut frame);

        assert!(matches!(result, Err(FeatureError::DuplicateColumn(name)) if name == "Dishwasher"));
        assert!(!frame.contains("Fridge / Freezer"));
        assert!(frame.contains("Appliances"));
    }
}
