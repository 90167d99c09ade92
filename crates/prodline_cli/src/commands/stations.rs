//! Stations command - Show the configured line.

use anyhow::Result;
use serde_json::json;

use super::{print_json, LineArgs};

pub async fn execute(line: &LineArgs) -> Result<()> {
    let service = line.service().await?;
    let production_line = service.line();

    let mut stations = Vec::new();
    for id in production_line.registry().ids() {
        let station = production_line.station(id)?;
        stations.push(json!({
            "station": station,
            "permittedStates": station.permitted_states(),
            "next": production_line.order().next_of(id),
        }));
    }

    print_json(&json!({
        "version": production_line.version(),
        "live": service.is_live(),
        "startStationId": production_line.start_station_id(),
        "path": production_line.path(),
        "stationOrder": production_line.order(),
        "estimatedProductionTime": production_line.estimated_production_time(),
        "stations": stations,
    }))
}
