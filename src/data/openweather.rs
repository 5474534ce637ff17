//! OpenWeather API client
//!
//! This module fetches current observations, extended forecasts, and
//! geocoding results from the OpenWeather API, and resolves an approximate
//! device location from the network. Every request is raced against a fixed
//! deadline; a request that outlives it fails with a timeout error no matter
//! what the network eventually returns.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tokio::time::timeout;

use super::{Condition, DailyOutlook, ForecastBundle, Location, TempRange, Units, WeatherSnapshot};

/// Base URL for the OpenWeather API
const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Endpoint used to resolve an approximate location from the network
const GEOLOCATE_URL: &str = "http://ip-api.com/json";

/// Default request deadline in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur when talking to the weather API
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The request outlived the fixed deadline
    #[error("request took too long, timed out after {0} seconds")]
    Timeout(u64),

    /// The API answered with a non-2xx status
    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// A place-name search returned zero results
    #[error("no match found for place \"{0}\"")]
    PlaceNotFound(String),

    /// The device location could not be determined
    #[error("unable to determine your location: {0}")]
    Geolocation(String),

    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse the API response body
    #[error("failed to parse API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("missing expected field in response: {0}")]
    MissingField(String),
}

/// A successful observation fetch: the resolved place plus the reading
#[derive(Debug, Clone)]
pub struct Observation {
    /// Location echoed by the provider, with its display name filled in
    pub location: Location,
    /// The observed current conditions
    pub snapshot: WeatherSnapshot,
}

/// Client for the OpenWeather API
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    api_key: String,
    deadline: Duration,
    /// Base URL for weather and geocoding endpoints (overridable for tests)
    base_url: String,
    /// URL for network geolocation (overridable for tests)
    geolocate_url: String,
}

impl WeatherClient {
    /// Create a new client with the default endpoints and deadline
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            deadline: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: OPENWEATHER_BASE_URL.to_string(),
            geolocate_url: GEOLOCATE_URL.to_string(),
        }
    }

    /// Create a client with a custom request deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Create a client with a custom API base URL
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create a client with a custom geolocation URL
    #[allow(dead_code)]
    pub fn with_geolocate_url(mut self, url: impl Into<String>) -> Self {
        self.geolocate_url = url.into();
        self
    }

    /// Fetch the current observation for the given coordinates
    ///
    /// Issues exactly one request, in metric units; imperial views are
    /// derived later by conversion.
    ///
    /// # Arguments
    /// * `location` - Coordinates to observe
    ///
    /// # Returns
    /// * `Ok(Observation)` - The resolved place and its current reading
    /// * `Err(WeatherError)` - If the request fails, times out, or cannot be parsed
    pub async fn current_observation(
        &self,
        location: &Location,
    ) -> Result<Observation, WeatherError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let request = self.http.get(&url).query(&[
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("units", "metric".to_string()),
            ("appid", self.api_key.clone()),
        ]);

        let response: ObservationResponse = self.get_json(request).await?;
        response.into_observation()
    }

    /// Fetch the provider's real extended forecast for the given coordinates
    ///
    /// Always fetched in metric units; callers wanting imperial convert the
    /// returned bundle.
    pub async fn extended_forecast(
        &self,
        location: &Location,
    ) -> Result<ForecastBundle, WeatherError> {
        let url = format!("{}/data/2.5/onecall", self.base_url);
        let request = self.http.get(&url).query(&[
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("exclude", "minutely,hourly".to_string()),
            ("units", "metric".to_string()),
            ("appid", self.api_key.clone()),
        ]);

        let response: OneCallResponse = self.get_json(request).await?;
        response.into_bundle(location)
    }

    /// Resolve a place name to coordinates via the geocoding endpoint
    ///
    /// # Returns
    /// * `Ok(Location)` - The best match, with its display name
    /// * `Err(WeatherError::PlaceNotFound)` - If the search returned zero results
    pub async fn search_place(&self, query: &str) -> Result<Location, WeatherError> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let request = self.http.get(&url).query(&[
            ("q", query.to_string()),
            ("limit", "1".to_string()),
            ("appid", self.api_key.clone()),
        ]);

        let matches: Vec<GeocodeEntry> = self.get_json(request).await?;
        let entry = matches
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::PlaceNotFound(query.to_string()))?;

        Ok(entry.into_location())
    }

    /// Resolve an approximate current location from the network
    ///
    /// Any failure surfaces as a geolocation error so the caller can tell
    /// the user the device location is unavailable.
    pub async fn locate(&self) -> Result<Location, WeatherError> {
        let request = self.http.get(&self.geolocate_url);

        let response: IpLocationResponse = self
            .get_json(request)
            .await
            .map_err(|e| WeatherError::Geolocation(e.to_string()))?;

        if response.status != "success" {
            let reason = response
                .message
                .unwrap_or_else(|| "location service refused the request".to_string());
            return Err(WeatherError::Geolocation(reason));
        }

        let name = match (response.city, response.country_code) {
            (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
            (Some(city), None) => Some(city),
            _ => None,
        };

        Ok(Location {
            latitude: response.lat,
            longitude: response.lon,
            name,
        })
    }

    /// Issue a GET request raced against the client deadline and parse the body
    ///
    /// Exactly one underlying network call, no retries. When the deadline
    /// fires first the caller stops waiting; whatever the network later
    /// produces is discarded.
    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, WeatherError> {
        let secs = self.deadline.as_secs();
        let response = timeout(self.deadline, request.send())
            .await
            .map_err(|_| WeatherError::Timeout(secs))??;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Http {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Extracts the provider's error message from a failure body
///
/// OpenWeather failure bodies carry a `message` field; when absent (or the
/// body is not JSON) the canonical status reason is used instead.
fn error_message(body: &str, status: StatusCode) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }

    serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

/// Response from the current-observation endpoint
#[derive(Debug, Deserialize)]
struct ObservationResponse {
    name: String,
    coord: Coord,
    weather: Vec<ConditionEntry>,
    main: MainReadings,
    wind: WindReading,
    visibility: Option<f64>,
    sys: SysReadings,
}

#[derive(Debug, Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    id: u16,
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WindReading {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct SysReadings {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

impl ObservationResponse {
    fn into_observation(self) -> Result<Observation, WeatherError> {
        let condition = first_condition(&self.weather)?;

        let name = match self.sys.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name,
        };

        Ok(Observation {
            location: Location {
                latitude: self.coord.lat,
                longitude: self.coord.lon,
                name: Some(name),
            },
            snapshot: WeatherSnapshot {
                temp: self.main.temp,
                feels_like: self.main.feels_like,
                temp_min: self.main.temp_min,
                temp_max: self.main.temp_max,
                humidity: self.main.humidity,
                wind_speed: self.wind.speed,
                visibility: self.visibility.unwrap_or(10_000.0),
                pressure: self.main.pressure,
                sunrise: self.sys.sunrise,
                sunset: self.sys.sunset,
                condition,
                captured_at: Utc::now(),
            },
        })
    }
}

/// Response from the one-call extended forecast endpoint
#[derive(Debug, Deserialize)]
struct OneCallResponse {
    current: OneCallCurrent,
    daily: Vec<OneCallDaily>,
}

#[derive(Debug, Deserialize)]
struct OneCallCurrent {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    wind_speed: f64,
    visibility: Option<f64>,
    pressure: f64,
    sunrise: i64,
    sunset: i64,
    weather: Vec<ConditionEntry>,
}

#[derive(Debug, Deserialize)]
struct OneCallDaily {
    sunrise: i64,
    sunset: i64,
    temp: OneCallTemp,
    humidity: f64,
    wind_speed: f64,
    weather: Vec<ConditionEntry>,
}

#[derive(Debug, Deserialize)]
struct OneCallTemp {
    day: f64,
    min: f64,
    max: f64,
}

/// Number of days carried in an extended forecast bundle
const FORECAST_DAYS: usize = 8;

impl OneCallResponse {
    fn into_bundle(self, location: &Location) -> Result<ForecastBundle, WeatherError> {
        let today = self
            .daily
            .first()
            .ok_or_else(|| WeatherError::MissingField("daily".to_string()))?;

        let condition = first_condition(&self.current.weather)?;

        let current = WeatherSnapshot {
            temp: self.current.temp,
            feels_like: self.current.feels_like,
            temp_min: today.temp.min,
            temp_max: today.temp.max,
            humidity: self.current.humidity,
            wind_speed: self.current.wind_speed,
            visibility: self.current.visibility.unwrap_or(10_000.0),
            pressure: self.current.pressure,
            sunrise: self.current.sunrise,
            sunset: self.current.sunset,
            condition,
            captured_at: Utc::now(),
        };

        let daily = self
            .daily
            .iter()
            .take(FORECAST_DAYS)
            .enumerate()
            .map(|(offset, day)| {
                Ok(DailyOutlook {
                    offset: offset as u8,
                    temp: TempRange {
                        day: day.temp.day,
                        min: day.temp.min,
                        max: day.temp.max,
                    },
                    humidity: day.humidity,
                    wind_speed: day.wind_speed,
                    condition: first_condition(&day.weather)?,
                    sunrise: day.sunrise,
                    sunset: day.sunset,
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;

        Ok(ForecastBundle {
            units: Units::Metric,
            location: location.clone(),
            current,
            daily,
        })
    }
}

fn first_condition(entries: &[ConditionEntry]) -> Result<Condition, WeatherError> {
    entries
        .first()
        .map(|w| Condition {
            code: w.id,
            description: w.description.clone(),
        })
        .ok_or_else(|| WeatherError::MissingField("weather".to_string()))
}

/// Entry from the geocoding endpoint
#[derive(Debug, Deserialize)]
struct GeocodeEntry {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
}

impl GeocodeEntry {
    fn into_location(self) -> Location {
        let name = match self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name,
        };

        Location {
            latitude: self.lat,
            longitude: self.lon,
            name: Some(name),
        }
    }
}

/// Response from the network geolocation endpoint
#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    status: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    city: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Sample current-observation response
    const OBSERVATION_BODY: &str = r#"{
        "coord": { "lon": -0.1278, "lat": 51.5074 },
        "weather": [ { "id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d" } ],
        "main": {
            "temp": 20.0,
            "feels_like": 19.2,
            "temp_min": 18.0,
            "temp_max": 22.0,
            "pressure": 1013,
            "humidity": 50
        },
        "visibility": 10000,
        "wind": { "speed": 3.0, "deg": 240 },
        "sys": { "country": "GB", "sunrise": 1000, "sunset": 2000 },
        "dt": 1688900000,
        "name": "London"
    }"#;

    /// Sample one-call response with two daily entries
    const ONECALL_BODY: &str = r#"{
        "current": {
            "temp": 20.0,
            "feels_like": 19.2,
            "pressure": 1013,
            "humidity": 50,
            "visibility": 10000,
            "wind_speed": 3.0,
            "sunrise": 1000,
            "sunset": 2000,
            "weather": [ { "id": 800, "description": "clear sky" } ]
        },
        "daily": [
            {
                "sunrise": 1000,
                "sunset": 2000,
                "temp": { "day": 20.0, "min": 18.0, "max": 22.0 },
                "humidity": 50,
                "wind_speed": 3.0,
                "weather": [ { "id": 800, "description": "clear sky" } ]
            },
            {
                "sunrise": 87400,
                "sunset": 88400,
                "temp": { "day": 21.0, "min": 17.5, "max": 23.0 },
                "humidity": 55,
                "wind_speed": 2.5,
                "weather": [ { "id": 500, "description": "light rain" } ]
            }
        ]
    }"#;

    fn test_location() -> Location {
        Location {
            latitude: 51.5074,
            longitude: -0.1278,
            name: None,
        }
    }

    #[test]
    fn test_observation_parsing() {
        let response: ObservationResponse =
            serde_json::from_str(OBSERVATION_BODY).expect("Failed to parse observation");
        let observation = response
            .into_observation()
            .expect("Observation should convert");

        assert_eq!(observation.location.name.as_deref(), Some("London, GB"));
        assert!((observation.location.latitude - 51.5074).abs() < 1e-9);
        assert!((observation.snapshot.temp - 20.0).abs() < 1e-9);
        assert!((observation.snapshot.temp_min - 18.0).abs() < 1e-9);
        assert!((observation.snapshot.temp_max - 22.0).abs() < 1e-9);
        assert!((observation.snapshot.humidity - 50.0).abs() < 1e-9);
        assert!((observation.snapshot.wind_speed - 3.0).abs() < 1e-9);
        assert_eq!(observation.snapshot.sunrise, 1000);
        assert_eq!(observation.snapshot.sunset, 2000);
        assert_eq!(observation.snapshot.condition.code, 802);
    }

    #[test]
    fn test_observation_parsing_without_visibility() {
        let body = OBSERVATION_BODY.replace("\"visibility\": 10000,", "");
        let response: ObservationResponse =
            serde_json::from_str(&body).expect("Failed to parse observation");
        let observation = response
            .into_observation()
            .expect("Observation should convert");

        assert!((observation.snapshot.visibility - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_observation_with_empty_conditions_is_rejected() {
        let body = OBSERVATION_BODY.replace(
            r#""weather": [ { "id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d" } ],"#,
            r#""weather": [],"#,
        );
        let response: ObservationResponse =
            serde_json::from_str(&body).expect("Failed to parse observation");
        let result = response.into_observation();

        match result {
            Err(WeatherError::MissingField(field)) => assert_eq!(field, "weather"),
            other => panic!("Expected MissingField error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_message_prefers_provider_message() {
        let body = r#"{"cod":"404","message":"city not found"}"#;
        let message = error_message(body, StatusCode::NOT_FOUND);
        assert_eq!(message, "city not found");
    }

    #[test]
    fn test_error_message_falls_back_to_status_reason() {
        let message = error_message("<html>oops</html>", StatusCode::BAD_GATEWAY);
        assert_eq!(message, "Bad Gateway");
    }

    #[tokio::test]
    async fn test_current_observation_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(OBSERVATION_BODY, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = WeatherClient::new("test-key").with_base_url(server.uri());
        let observation = client
            .current_observation(&test_location())
            .await
            .expect("fetch should succeed");

        assert_eq!(observation.location.name.as_deref(), Some("London, GB"));
        assert!((observation.snapshot.temp - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_raw(r#"{"cod":401,"message":"Invalid API key"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = WeatherClient::new("bad-key").with_base_url(server.uri());
        let err = client
            .current_observation(&test_location())
            .await
            .expect_err("fetch should fail");

        match err {
            WeatherError::Http { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_response_resolves_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(OBSERVATION_BODY, "application/json")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = WeatherClient::new("test-key")
            .with_base_url(server.uri())
            .with_deadline(Duration::from_millis(50));
        let err = client
            .current_observation(&test_location())
            .await
            .expect_err("fetch should time out");

        assert!(matches!(err, WeatherError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_search_place_returns_best_match() {
        let server = MockServer::start().await;
        let body = r#"[{"name":"London","lat":51.5074,"lon":-0.1278,"country":"GB"}]"#;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "London"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let client = WeatherClient::new("test-key").with_base_url(server.uri());
        let location = client
            .search_place("London")
            .await
            .expect("search should succeed");

        assert_eq!(location.name.as_deref(), Some("London, GB"));
        assert!((location.latitude - 51.5074).abs() < 1e-9);
        assert!((location.longitude - (-0.1278)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_search_place_empty_results_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        let client = WeatherClient::new("test-key").with_base_url(server.uri());
        let err = client
            .search_place("Nowhereville")
            .await
            .expect_err("search should fail");

        match err {
            WeatherError::PlaceNotFound(query) => assert_eq!(query, "Nowhereville"),
            other => panic!("Expected PlaceNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_locate_resolves_city_and_country() {
        let server = MockServer::start().await;
        let body = r#"{"status":"success","lat":49.28,"lon":-123.12,"city":"Vancouver","countryCode":"CA"}"#;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let client = WeatherClient::new("test-key").with_geolocate_url(server.uri());
        let location = client.locate().await.expect("locate should succeed");

        assert_eq!(location.name.as_deref(), Some("Vancouver, CA"));
        assert!((location.latitude - 49.28).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_locate_failure_maps_to_geolocation_error() {
        let server = MockServer::start().await;
        let body = r#"{"status":"fail","message":"private range"}"#;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let client = WeatherClient::new("test-key").with_geolocate_url(server.uri());
        let err = client.locate().await.expect_err("locate should fail");

        match err {
            WeatherError::Geolocation(message) => assert!(message.contains("private range")),
            other => panic!("Expected Geolocation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extended_forecast_builds_bundle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .and(query_param("exclude", "minutely,hourly"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(ONECALL_BODY, "application/json"))
            .mount(&server)
            .await;

        let client = WeatherClient::new("test-key").with_base_url(server.uri());
        let bundle = client
            .extended_forecast(&test_location())
            .await
            .expect("fetch should succeed");

        assert_eq!(bundle.units, Units::Metric);
        assert_eq!(bundle.daily.len(), 2);
        assert_eq!(bundle.daily[0].offset, 0);
        assert_eq!(bundle.daily[1].offset, 1);
        // Today's range comes from the first daily entry
        assert!((bundle.current.temp_min - 18.0).abs() < 1e-9);
        assert!((bundle.current.temp_max - 22.0).abs() < 1e-9);
        assert_eq!(bundle.daily[1].condition.code, 500);
    }
}
