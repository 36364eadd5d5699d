//! Checks run before any mutating call. Nothing here touches state.

use crate::connector::{Connector, DateRange, PeriodicSettings};
use crate::error::ValidationError;
use crate::kind::ConnectorKind;

/// Start must not be after end. Only range-using kinds are checked; kinds
/// driven by folder selection or static config never look at the range.
pub fn check_date_range(kind: ConnectorKind, range: &DateRange) -> Result<(), ValidationError> {
    if kind.traits().uses_date_range() && range.is_inverted() {
        return Err(ValidationError::InvertedDateRange);
    }
    Ok(())
}

/// Raw frequency input must be one of the allowed minute values.
pub fn check_frequency(enabled: bool, frequency: &str) -> Result<PeriodicSettings, ValidationError> {
    PeriodicSettings::from_form(enabled, frequency).map_err(ValidationError::InvalidFrequency)
}

/// Periodic sync requires an indexable kind that supports it and, for
/// selection-based kinds, at least one selected item. `periodic_enabled` is
/// the schedule that will be in effect after the change, whether requested
/// or already stored.
pub fn check_periodic(
    kind: ConnectorKind,
    periodic_enabled: bool,
    is_indexable: bool,
    selected_items: usize,
) -> Result<(), ValidationError> {
    if !periodic_enabled {
        return Ok(());
    }
    let traits = kind.traits();
    if !is_indexable || !traits.indexable {
        return Err(ValidationError::PeriodicOnNonIndexable);
    }
    if !traits.supports_periodic_sync {
        return Err(ValidationError::PeriodicUnsupported(kind.title()));
    }
    if traits.requires_item_selection() && selected_items == 0 {
        return Err(ValidationError::PeriodicWithoutSelection);
    }
    Ok(())
}

/// Folder-selection connectors cannot be indexed with nothing selected.
pub fn check_selection(connector: &Connector) -> Result<(), ValidationError> {
    if connector.connector_type.traits().uses_folder_selection() && connector.selected_item_count() == 0 {
        return Err(ValidationError::EmptySelection);
    }
    Ok(())
}
