//! Turns a loaded screen into HTML and captures it as a PNG with a
//! headless browser.
//!
//! The browser needs a URL to navigate to, so the page is served from an
//! ephemeral local server for the duration of the capture. Dev mode
//! keeps a server running instead and rebuilds the screen on every
//! request.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};

use crate::card::{Card, CardKind};
use crate::chart::Chart;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::screen::{self, ScreenData};

/// Renders the screen to a standalone HTML page.
pub fn html(data: &ScreenData) -> String {
    let cards: String = data.cards.iter().map(card_html).collect();

    include_str!("screen.html")
        .replace("{{TITLE}}", &data.header.title)
        .replace("{{ICON}}", &data.header.condition_icon)
        .replace(
            "{{MAX_TEMPERATURE}}",
            &data.header.max_temperature.to_string(),
        )
        .replace(
            "{{MIN_TEMPERATURE}}",
            &data.header.min_temperature.to_string(),
        )
        .replace("{{CARDS}}", &cards)
}

fn card_html(card: &Card) -> String {
    let mut sections = String::new();

    if !card.title.is_empty() {
        sections.push_str(&format!("<h2>{}</h2>\n", card.title));
    }
    match card.kind {
        CardKind::Text => {
            sections.push_str(&format!("<div class=\"body\">{}</div>\n", card.body));
        }
        CardKind::List => {
            sections.push_str("<ul>\n");
            for item in &card.items {
                sections.push_str(&format!("<li>{}</li>\n", item));
            }
            sections.push_str("</ul>\n");
        }
        CardKind::Chart => sections.push_str(&chart_html(&card.chart)),
    }
    if !card.footer.is_empty() {
        sections.push_str(&format!("<div class=\"footer\">{}</div>\n", card.footer));
    }

    format!("<div class=\"card\">\n{sections}</div>\n")
}

fn chart_html(chart: &Chart) -> String {
    let ceiling = chart.ceiling().max(1);
    let mut bars = String::new();

    for (hour, value) in chart.data.iter().enumerate() {
        let value = *value;
        let height = value.clamp(0, ceiling) * 100 / ceiling;
        let opacity = if chart.options.high > 0 {
            (value as f32 / chart.options.high as f32).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let class = if chart.hours.contains(hour as u32) {
            "bar"
        } else {
            "bar off-hours"
        };
        bars.push_str(&format!(
            "<div class=\"{class}\" style=\"height: {height}%; opacity: {opacity:.2}\" title=\"{hour}h: {value}\"></div>"
        ));
    }

    format!("<div class=\"chart\">{bars}</div>\n")
}

/// Captures the screen as a 1280x720 PNG.
///
/// The page is served from an ephemeral local server and a headless
/// browser navigates to it; the blocking browser work runs on the
/// blocking thread pool.
pub async fn screenshot(data: &ScreenData) -> Result<Vec<u8>> {
    let page = html(data);
    tokio::task::spawn_blocking(move || capture(page))
        .await
        .map_err(|e| Error::RenderError(format!("screenshot task failed: {e}")))?
}

fn capture(page: String) -> Result<Vec<u8>> {
    let server = tiny_http::Server::http("127.0.0.1:0")
        .map_err(|e| Error::RenderError(format!("Failed to start local server: {e}")))?;
    let addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| Error::RenderError("local server has no IP address".into()))?;
    let url = format!("http://{addr}/");
    let content_type = html_content_type()?;

    let server = Arc::new(server);
    let worker = {
        let server = Arc::clone(&server);
        thread::spawn(move || {
            for request in server.incoming_requests() {
                let response = tiny_http::Response::from_string(page.as_str())
                    .with_header(content_type.clone());
                let _ = request.respond(response);
            }
        })
    };

    let result = capture_url(&url);

    server.unblock();
    let _ = worker.join();

    result
}

fn capture_url(url: &str) -> Result<Vec<u8>> {
    let launch_options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .window_size(Some((1280, 720)))
        .build()
        .map_err(|e| Error::RenderError(format!("Failed to build launch options: {e}")))?;

    let browser = Browser::new(launch_options)
        .map_err(|e| Error::RenderError(format!("Failed to launch browser: {e}")))?;
    let tab = browser
        .new_tab()
        .map_err(|e| Error::RenderError(format!("Failed to create tab: {e}")))?;

    tab.navigate_to(url)
        .map_err(|e| Error::RenderError(format!("Navigation failed: {e}")))?;
    tab.wait_until_navigated()
        .map_err(|e| Error::RenderError(format!("Wait for navigation failed: {e}")))?;

    // Let the page settle before the capture.
    thread::sleep(Duration::from_secs(1));

    tab.capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
        .map_err(|e| Error::RenderError(format!("Screenshot failed: {e}")))
}

/// Serves the screen over HTTP for development. Every request rebuilds
/// the cards and reloads them, so refreshing the browser shows fresh
/// data. Blocks until enter is pressed.
pub async fn dev_server(addr: &str, config: Config, fake: bool) -> Result<()> {
    let server = tiny_http::Server::http(addr)
        .map_err(|e| Error::RenderError(format!("Failed to start dev server: {e}")))?;
    let content_type = html_content_type()?;

    let server = Arc::new(server);
    let handle = tokio::runtime::Handle::current();
    let worker = {
        let server = Arc::clone(&server);
        thread::spawn(move || {
            for request in server.incoming_requests() {
                match dev_page(&handle, &config, fake) {
                    Ok(page) => {
                        let response = tiny_http::Response::from_string(page)
                            .with_header(content_type.clone());
                        let _ = request.respond(response);
                    }
                    Err(e) => {
                        tracing::error!("failed to build screen: {e}");
                        let response =
                            tiny_http::Response::from_string(e.to_string()).with_status_code(500);
                        let _ = request.respond(response);
                    }
                }
            }
        })
    };

    println!("Server running on http://{addr}/");
    println!("Press enter to stop");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    server.unblock();
    let _ = worker.join();
    Ok(())
}

fn dev_page(handle: &tokio::runtime::Handle, config: &Config, fake: bool) -> Result<String> {
    let (header, cards) = screen::build_cards(config, fake)?;
    let (data, error) = handle.block_on(screen::assemble(header, cards));
    if let Some(error) = error {
        tracing::warn!("failed to load some cards: {error}");
    }
    Ok(html(&data))
}

fn html_content_type() -> Result<tiny_http::Header> {
    "Content-Type: text/html; charset=utf-8"
        .parse::<tiny_http::Header>()
        .map_err(|_| Error::RenderError("invalid content type header".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, CardKind};
    use crate::chart::{ChartOptions, HourRange};
    use crate::header::Header;

    fn sample_header() -> Header {
        let mut header = Header::default();
        header.title = "Dimanche 9 mars".into();
        header.condition_icon = "sunny".into();
        header.max_temperature = 8;
        header.min_temperature = -2;
        header
    }

    #[test]
    fn html_embeds_the_header_and_cards_in_order() {
        let data = ScreenData {
            header: sample_header(),
            cards: vec![
                Card::new(CardKind::Text, 100)
                    .with_title("Aujourd'hui")
                    .with_body("Rien de prévu."),
                Card::new(CardKind::Text, 35)
                    .with_title("Angra")
                    .with_body("<img src=\"http://example.com/a.jpg\">"),
            ],
        };

        let page = html(&data);

        assert!(page.contains("<h1>Dimanche 9 mars</h1>"));
        assert!(page.contains("href=\"#sunny\""));
        assert!(page.contains("8°"));
        assert!(page.contains("-2°"));
        assert!(page.contains("<img src=\"http://example.com/a.jpg\">"));

        let first = page.find("Aujourd'hui").unwrap();
        let second = page.find("Angra").unwrap();
        assert!(first < second);
    }

    #[test]
    fn list_cards_render_their_items() {
        let mut card = Card::new(CardKind::List, 100).with_title("Demain");
        card.items = vec!["09h05 Matin".into(), "Soir".into()];
        let data = ScreenData {
            header: sample_header(),
            cards: vec![card],
        };

        let page = html(&data);
        assert!(page.contains("<li>09h05 Matin</li>"));
        assert!(page.contains("<li>Soir</li>"));
    }

    #[test]
    fn chart_bars_scale_against_the_ceiling() {
        let mut card = Card::new(CardKind::Chart, 75).with_title("Qualité de l'air");
        card.chart = Chart {
            data: vec![0, 50, 100, 200],
            hours: HourRange { start: 1, end: 2 },
            options: ChartOptions {
                top: 100,
                step: 25,
                min: 45,
                high: 100,
            },
        };
        let data = ScreenData {
            header: sample_header(),
            cards: vec![card],
        };

        let page = html(&data);
        // Ceiling steps up to 200, so 50 renders at a quarter height.
        assert!(page.contains("height: 25%"));
        assert!(page.contains("height: 100%"));
        assert!(page.contains("opacity: 0.50"));
        assert!(page.contains("off-hours"));
    }

    #[tokio::test]
    #[ignore] // Requires Chrome to be installed
    async fn captures_a_png_screenshot() {
        let data = ScreenData {
            header: sample_header(),
            cards: vec![Card::new(CardKind::Text, 1)
                .with_title("Disco!")
                .with_body("J'ai mal au coeur")],
        };

        let png = screenshot(&data).await.unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
