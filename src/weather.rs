/*
 * @file weather.rs
 * @brief Weather lookup service
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! OpenWeatherMap collaborator for the `weather` command.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{CommanderError, CommanderResult};

/// Default OpenWeatherMap current-weather endpoint.
pub const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);

/// Current conditions for one city, metric units.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub description: String,
    pub humidity: u8,
}

impl WeatherReport {
    /// Renders the report as a single spoken sentence.
    pub fn summary(&self) -> String {
        format!(
            "Weather in {}: {}°C (feels like {}°C), {}, humidity {}%",
            self.city, self.temperature, self.feels_like, self.description, self.humidity
        )
    }
}

/// Outcome of a weather lookup that is not a transport failure.
#[derive(Clone, Debug, PartialEq)]
pub enum WeatherLookup {
    Found(WeatherReport),
    UnknownCity,
}

/// Provider of current weather conditions.
pub trait WeatherService {
    /// # Errors
    /// Returns [`CommanderError`] when the provider cannot be reached or
    /// answers with anything other than a report or an unknown-city status.
    fn current(&self, city: &str) -> CommanderResult<WeatherLookup>;
}

#[derive(Deserialize)]
struct OwmResponse {
    main: OwmMain,
    weather: Vec<OwmCondition>,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Deserialize)]
struct OwmCondition {
    description: String,
}

/// Blocking OpenWeatherMap client.
pub struct OpenWeatherMap {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl OpenWeatherMap {
    /// # Errors
    /// Returns [`CommanderError::Http`] when the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> CommanderResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(WEATHER_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }
}

impl WeatherService for OpenWeatherMap {
    fn current(&self, city: &str) -> CommanderResult<WeatherLookup> {
        tracing::debug!(city, "requesting weather");
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(WeatherLookup::UnknownCity),
            status if !status.is_success() => {
                return Err(CommanderError::Status {
                    service: "OpenWeatherMap",
                    status: status.as_u16(),
                })
            }
            _ => {}
        }
        let body: OwmResponse = response.json()?;
        let description = body
            .weather
            .into_iter()
            .next()
            .map(|condition| condition.description)
            .ok_or(CommanderError::MalformedResponse("OpenWeatherMap"))?;
        Ok(WeatherLookup::Found(WeatherReport {
            city: city.to_string(),
            temperature: body.main.temp,
            feels_like: body.main.feels_like,
            description,
            humidity: body.main.humidity,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const LONDON: &str = r#"{
        "weather": [{"id": 500, "main": "Rain", "description": "light rain"}],
        "main": {"temp": 12.5, "feels_like": 11.0, "humidity": 81}
    }"#;

    #[test]
    fn parses_current_conditions() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/weather")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "london".into()),
                Matcher::UrlEncoded("appid".into(), "secret".into()),
                Matcher::UrlEncoded("units".into(), "metric".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LONDON)
            .create();
        let service = OpenWeatherMap::new(format!("{}/weather", server.url()), "secret").unwrap();
        let lookup = service.current("london").unwrap();
        let WeatherLookup::Found(report) = lookup else {
            panic!("expected a report");
        };
        assert_eq!(report.description, "light rain");
        assert_eq!(report.humidity, 81);
        assert_eq!(
            report.summary(),
            "Weather in london: 12.5°C (feels like 11°C), light rain, humidity 81%"
        );
        mock.assert();
    }

    #[test]
    fn not_found_is_unknown_city() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/weather")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"cod":"404","message":"city not found"}"#)
            .create();
        let service = OpenWeatherMap::new(format!("{}/weather", server.url()), "secret").unwrap();
        assert_eq!(service.current("atlantis").unwrap(), WeatherLookup::UnknownCity);
    }

    #[test]
    fn unauthorized_is_an_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/weather")
            .match_query(Matcher::Any)
            .with_status(401)
            .create();
        let service = OpenWeatherMap::new(format!("{}/weather", server.url()), "bad").unwrap();
        let err = service.current("paris").unwrap_err();
        assert!(matches!(err, CommanderError::Status { status: 401, .. }));
    }
}
