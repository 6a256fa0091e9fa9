//! PIP service for looking up the admin hierarchy of a building.

use geo::InteriorPoint;
use tracing::debug;

use super::{normalize_admin_name, AdminBoundary, AdminSpatialIndex};
use crate::encoder;
use crate::models::{AdminEntry, AdminHierarchy, AdminLevel, AdminSelection, Feature};

/// Point-in-Polygon lookup service
pub struct PipService {
    index: AdminSpatialIndex,
}

impl PipService {
    /// Create a new PIP service from a spatial index
    pub fn new(index: AdminSpatialIndex) -> Self {
        Self { index }
    }

    /// Build the admin hierarchy for a point
    pub fn lookup(&self, lon: f64, lat: f64) -> AdminHierarchy {
        let mut hierarchy = AdminHierarchy::default();

        for level in AdminLevel::all() {
            if let Some(boundary) = self.index.lookup_at_level(lon, lat, *level) {
                hierarchy.set(*level, boundary.entry.clone());
            }
        }

        debug!(
            "PIP lookup at ({}, {}): {:?}",
            lon,
            lat,
            hierarchy.to_selection()
        );

        hierarchy
    }

    /// Admin hierarchy at a feature's centroid.
    ///
    /// `None` when the feature has no usable geometry or no boundary contains it.
    pub fn resolve_feature(&self, feature: &Feature) -> Option<AdminHierarchy> {
        let geometry = feature.geometry.as_ref()?;
        let point = encoder::centroid(geometry).ok()?;
        let hierarchy = self.lookup(point.lon, point.lat);
        (!hierarchy.is_empty()).then_some(hierarchy)
    }

    /// Address segments for a feature, resolved from boundaries
    pub fn resolve_selection(&self, feature: &Feature) -> Option<AdminSelection> {
        self.resolve_feature(feature)
            .map(|hierarchy| hierarchy.to_selection())
    }

    /// Entries of a level, optionally restricted to one parent (code or name)
    /// and filtered by a name fragment. Sorted by name.
    pub fn list(
        &self,
        level: AdminLevel,
        parent: Option<&str>,
        query: Option<&str>,
    ) -> Vec<AdminEntry> {
        let wanted = query.map(normalize_admin_name).filter(|q| !q.is_empty());

        let mut entries: Vec<AdminEntry> = self
            .index
            .boundaries_at_level(level)
            .iter()
            .filter(|b| parent.map_or(true, |p| self.has_parent(b, p)))
            .filter(|b| {
                wanted.as_ref().map_or(true, |q| {
                    b.entry
                        .name
                        .as_deref()
                        .map_or(false, |n| normalize_admin_name(n).contains(q.as_str()))
                })
            })
            .map(|b| b.entry.clone())
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        entries
    }

    /// Whether `boundary` sits under `parent`. Uses the dataset's parent code
    /// when present, otherwise locates the boundary's interior point.
    fn has_parent(&self, boundary: &AdminBoundary, parent: &str) -> bool {
        if let Some(code) = &boundary.entry.parent_code {
            return code == parent;
        }

        let Some(parent_level) = boundary.entry.level.parent() else {
            return false;
        };
        let Some(point) = boundary.geometry.interior_point() else {
            return false;
        };

        let wanted = normalize_admin_name(parent);
        self.index
            .lookup_at_level(point.x(), point.y(), parent_level)
            .map_or(false, |p| {
                p.entry.code.as_deref() == Some(parent)
                    || (!wanted.is_empty()
                        && p.entry
                            .name
                            .as_deref()
                            .map_or(false, |n| normalize_admin_name(n) == wanted))
            })
    }

    /// Get the spatial index (for stats/debugging)
    pub fn index(&self) -> &AdminSpatialIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pip::fixtures::square;
    use serde_json::json;

    fn service() -> PipService {
        let mut tagged = square(
            AdminLevel::District,
            "KH-1201",
            "Chamkar Mon",
            (104.9, 11.5),
            0.1,
        );
        tagged.entry.parent_code = Some("KH-12".to_string());

        PipService::new(AdminSpatialIndex::build(vec![
            square(AdminLevel::Country, "LAO", "Laos", (100.0, 14.0), 8.0),
            square(AdminLevel::Country, "KHM", "Cambodia", (102.0, 10.0), 4.0),
            square(AdminLevel::Province, "LA-VT", "Vientiane Prefecture", (102.0, 17.5), 1.0),
            square(AdminLevel::Province, "KH-12", "Phnom Penh", (104.5, 11.2), 0.8),
            square(AdminLevel::District, "LA-VT-1", "Chanthabuly", (102.5, 17.9), 0.2),
            square(AdminLevel::District, "LA-VT-2", "Sisattanak", (102.7, 17.9), 0.2),
            tagged,
            square(AdminLevel::Village, "V1", "Ban Mixay", (102.59, 17.96), 0.02),
        ]))
    }

    #[test]
    fn test_empty_hierarchy() {
        let service = PipService::new(AdminSpatialIndex::build(vec![]));
        let hierarchy = service.lookup(102.6, 17.97);
        assert!(hierarchy.country.is_none());
        assert!(hierarchy.is_empty());
    }

    #[test]
    fn test_lookup_fills_levels() {
        let hierarchy = service().lookup(102.6, 17.97);
        assert_eq!(hierarchy.country.unwrap().label(), "LAO");
        assert_eq!(hierarchy.province.unwrap().label(), "LA-VT");
        assert_eq!(hierarchy.district.unwrap().label(), "LA-VT-1");
        assert!(hierarchy.city.is_none());
        assert_eq!(hierarchy.village.unwrap().label(), "V1");
    }

    #[test]
    fn test_resolve_selection() {
        let feature = Feature::new(json!({
            "type": "Polygon",
            "coordinates": [[[102.6, 17.97], [102.601, 17.97], [102.601, 17.971], [102.6, 17.97]]]
        }));
        let selection = service().resolve_selection(&feature).unwrap();
        assert_eq!(selection.country, "LAO");
        assert_eq!(selection.state, "LA-VT");
        assert_eq!(selection.district, "LA-VT-1");
        assert_eq!(selection.city, "");
        assert_eq!(selection.village, "V1");
    }

    #[test]
    fn test_resolve_outside_boundaries() {
        let feature = Feature::new(json!({"type": "Point", "coordinates": [0.0, 0.0]}));
        assert!(service().resolve_selection(&feature).is_none());

        let feature = Feature::new(json!({"type": "Polygon", "coordinates": [[]]}));
        assert!(service().resolve_selection(&feature).is_none());
    }

    #[test]
    fn test_list_by_parent() {
        let service = service();

        let laos: Vec<String> = service
            .list(AdminLevel::District, Some("LA-VT"), None)
            .into_iter()
            .filter_map(|e| e.code)
            .collect();
        assert_eq!(laos, vec!["LA-VT-1", "LA-VT-2"]);

        // parent given by name, spelling variant
        let by_name = service.list(AdminLevel::District, Some("Fnom Penh"), None);
        assert!(by_name.is_empty(), "tagged parent codes match by code only");

        let by_code = service.list(AdminLevel::District, Some("KH-12"), None);
        assert_eq!(by_code.len(), 1);

        let provinces = service.list(AdminLevel::Province, Some("Laos"), None);
        assert_eq!(provinces.len(), 1);
        assert_eq!(provinces[0].label(), "LA-VT");
    }

    #[test]
    fn test_list_by_query() {
        let found = service().list(AdminLevel::District, None, Some("sisat"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("Sisattanak"));

        let all = service().list(AdminLevel::District, None, Some("  "));
        assert_eq!(all.len(), 3);
    }
}
