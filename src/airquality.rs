//! Air quality card, backed by the Open-Meteo air quality API.

use serde::Deserialize;

use crate::card::{Card, CardContent, CardKind};
use crate::chart::{Chart, ChartOptions, HourRange};
use crate::error::Result;
use crate::fake::smooth_random_values;
use crate::fetch::{http_client, Fetcher};
use crate::weather::LatLng;

/// Options for the air quality card.
#[derive(Debug, Clone)]
pub struct AirQualityOptions {
    pub location: LatLng,
    pub relevant_hours: HourRange,
    pub chart: ChartOptions,
}

/// Creates the air quality Card for the given location.
pub fn card(options: &AirQualityOptions) -> Card {
    let location = options.location;
    make_card(
        options,
        Fetcher::new(async move { fetch_air_quality(location).await }),
    )
}

/// Creates an air quality Card backed by fake data.
pub fn fake_card(options: &AirQualityOptions) -> Card {
    make_card(options, Fetcher::new(async { Ok(smooth_random_values(24, 0, 250)) }))
}

fn make_card(options: &AirQualityOptions, aqi: Fetcher<Vec<i32>>) -> Card {
    let hours = options.relevant_hours;
    let chart_options = options.chart;
    Card::new(CardKind::Chart, 75)
        .with_title("Qualité de l'air")
        .with_loader(async move {
            let data = aqi.get().await?;
            Ok(CardContent::Chart(Chart {
                data,
                hours,
                options: chart_options,
            }))
        })
}

async fn fetch_air_quality(location: LatLng) -> Result<Vec<i32>> {
    let url = format!(
        "https://air-quality-api.open-meteo.com/v1/air-quality?latitude={}&longitude={}\
         &hourly=us_aqi&forecast_days=1&timezone=auto",
        location.lat, location.lng,
    );

    let body = http_client()?
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    parse_air_quality_response(&body)
}

fn parse_air_quality_response(body: &str) -> Result<Vec<i32>> {
    #[derive(Deserialize)]
    struct Response {
        hourly: Hourly,
    }
    #[derive(Deserialize)]
    struct Hourly {
        // The API reports null for hours without a measurement.
        us_aqi: Vec<Option<i32>>,
    }

    let response: Response = serde_json::from_str(body)?;
    Ok(response
        .hourly
        .us_aqi
        .into_iter()
        .map(|v| v.unwrap_or(0))
        .collect())
}
