use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search.php";
const ROUTING_URL: &str = "https://www.mvg.de/api/fahrinfo/routing/";

/// TUM Garching campus, the fixed commute destination
const CAMPUS_COORDINATES: (&str, &str) = ("48.26560225", "11.669936877671844");

/// One Nominatim search result; coordinates come back as strings
#[derive(Debug, Clone, Deserialize)]
struct GeocodeResult {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct RoutingResponse {
    #[serde(rename = "connectionList")]
    connection_list: Vec<Connection>,
}

/// Departure and arrival are epoch milliseconds
#[derive(Debug, Deserialize)]
struct Connection {
    departure: i64,
    arrival: i64,
}

/// Geocoded origin plus transit time to campus
#[derive(Debug, Clone)]
pub struct Commute {
    pub lat: String,
    pub lon: String,
    pub minutes: f64,
}

/// Resolves free-text addresses to coordinates and asks the MVG routing API
/// for a transit connection to campus. Always takes the first result of
/// both lookups.
pub struct CommutePlanner {
    client: Client,
}

impl CommutePlanner {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    pub async fn commute_from(&self, location: &str) -> Result<Commute> {
        let results: Vec<GeocodeResult> = self
            .client
            .get(GEOCODE_URL)
            .query(&[("q", location), ("format", "jsonv2")])
            .send()
            .await
            .context("Geocoding request failed")?
            .json()
            .await
            .context("Geocoding response was not valid JSON")?;

        let origin = results
            .into_iter()
            .next()
            .with_context(|| format!("No geocoding results for {location:?}"))?;

        debug!("Geocoded {:?} to ({}, {})", location, origin.lat, origin.lon);

        let response: RoutingResponse = self
            .client
            .get(ROUTING_URL)
            .query(&[
                ("fromLatitude", origin.lat.as_str()),
                ("fromLongitude", origin.lon.as_str()),
                ("toLatitude", CAMPUS_COORDINATES.0),
                ("toLongitude", CAMPUS_COORDINATES.1),
            ])
            .send()
            .await
            .context("Routing request failed")?
            .json()
            .await
            .context("Routing response was not valid JSON")?;

        let minutes = first_connection_minutes(&response)?;

        Ok(Commute {
            lat: origin.lat,
            lon: origin.lon,
            minutes,
        })
    }
}

/// Duration of the first returned connection, in minutes
fn first_connection_minutes(response: &RoutingResponse) -> Result<f64> {
    let connection = response
        .connection_list
        .first()
        .context("Routing returned no connections")?;

    Ok((connection.arrival - connection.departure) as f64 / 60_000.0)
}
