//! Query text construction.
//!
//! Both backends accept the same SQL subset, so a single builder produces
//! the query for either. Numbers are rendered with six decimal digits so
//! that the query text, which doubles as a cache key, is stable.

use tracing::debug;

use super::bounds::Bounds;
use super::condition::sanitize_condition;
use crate::catalog::TableDescriptor;

/// Columns to select and the query that selects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Output column names, in select order.
    pub fields: Vec<String>,
    pub query_text: String,
}

/// Builds the query for `field_name` of `table`.
///
/// With `bounds` the query selects `lat,lon,field` inside the rectangle
/// using strict inequalities, so points exactly on an edge are excluded.
/// Without bounds it selects `field` filtered by `condition`, which is
/// replaced by `TRUE` unless it is a simple column filter.
///
/// `limit` must already be clamped by the caller.
pub fn build_query(
    table: &TableDescriptor,
    field_name: &str,
    bounds: Option<&Bounds>,
    condition: &str,
    limit: u32,
) -> QueryPlan {
    let lat = table.lat_field.as_str();
    let lon = table.lon_field.as_str();

    let (fields, predicate) = match bounds {
        Some(b) => (
            vec![lat.to_string(), lon.to_string(), field_name.to_string()],
            format!(
                "{lat} > {:.6} AND {lat} < {:.6} AND {lon} > {:.6} AND {lon} < {:.6}",
                b.sw_lat, b.ne_lat, b.sw_lon, b.ne_lon
            ),
        ),
        None => (vec![field_name.to_string()], sanitize_condition(condition)),
    };

    let query_text = format!(
        "SELECT {} FROM {} WHERE {} LIMIT {}",
        fields.join(","),
        table.id,
        predicate,
        limit
    );
    debug!(query = %query_text, "Built query");

    QueryPlan { fields, query_text }
}
