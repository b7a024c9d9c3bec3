//! Header section of the screen: localized date and today's weather.

use chrono::{DateTime, Duration, Local};
use futures::future::BoxFuture;
use futures::FutureExt;
use rand::Rng;

use crate::error::Result;
use crate::weather::WeatherInfo;

/// Information for the header section of the screen.
/// [`load`](Self::load) populates the fields.
#[derive(Default)]
pub struct Header {
    pub title: String,
    /// SVG icon name for today's condition.
    pub condition_icon: String,
    pub max_temperature: i32,
    pub min_temperature: i32,

    loader: Option<BoxFuture<'static, Result<HeaderData>>>,
}

struct HeaderData {
    title: String,
    condition_icon: String,
    max_temperature: i32,
    min_temperature: i32,
}

impl Header {
    pub async fn load(&mut self) -> Result<()> {
        if let Some(loader) = self.loader.take() {
            let data = loader.await?;
            self.title = data.title;
            self.condition_icon = data.condition_icon;
            self.max_temperature = data.max_temperature;
            self.min_temperature = data.min_temperature;
        }
        Ok(())
    }
}

/// Creates the Header for today, fed by the given weather.
pub fn new(weather: WeatherInfo) -> Header {
    make_header(weather, Local::now)
}

/// Creates a Header with a random date, so repeated fake renders show
/// the whole range of titles.
pub fn fake(weather: WeatherInfo) -> Header {
    make_header(weather, || {
        Local::now() + Duration::days(rand::thread_rng().gen_range(0..364))
    })
}

fn make_header<F>(mut weather: WeatherInfo, get_time: F) -> Header
where
    F: FnOnce() -> DateTime<Local> + Send + 'static,
{
    Header {
        title: String::new(),
        condition_icon: String::new(),
        max_temperature: 0,
        min_temperature: 0,
        loader: Some(
            async move {
                let now = get_time();
                weather.load().await?;

                Ok(HeaderData {
                    title: french_date(now),
                    condition_icon: weather.condition,
                    max_temperature: weather.max_temperature,
                    min_temperature: weather.min_temperature,
                })
            }
            .boxed(),
        ),
    }
}

/// Weekday and month names, English to French.
static FRENCH_TERMS: &[(&str, &str)] = &[
    ("Sunday", "Dimanche"),
    ("Monday", "Lundi"),
    ("Tuesday", "Mardi"),
    ("Wednesday", "Mercredi"),
    ("Thursday", "Jeudi"),
    ("Friday", "Vendredi"),
    ("Saturday", "Samedi"),
    ("January", "janvier"),
    ("February", "février"),
    ("March", "mars"),
    ("April", "avril"),
    ("May", "mai"),
    ("June", "juin"),
    ("July", "juillet"),
    ("August", "août"),
    ("September", "septembre"),
    ("October", "octobre"),
    ("November", "novembre"),
    ("December", "décembre"),
];

fn french_date(now: DateTime<Local>) -> String {
    let date = now.format("%A %-d %B").to_string();
    FRENCH_TERMS
        .iter()
        .fold(date, |date, (english, french)| date.replace(english, french))
}
