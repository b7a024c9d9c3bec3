//! Picture card, scraped from a configurable web page.

use rand::seq::SliceRandom;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::card::{Card, CardContent, CardKind};
use crate::error::{Error, Result};
use crate::fetch::{http_client, Fetcher};

/// Options for the picture Card.
#[derive(Debug, Clone)]
pub struct PictureOptions {
    /// The URL of the page to scrape for pictures.
    pub page_url: String,
    /// CSS selector for the image elements.
    pub image_selector: String,
    /// CSS selector for the label, resolved inside the image element and
    /// then inside its parent.
    pub label_selector: String,
}

/// Creates a Card displaying a random picture and its label from the
/// configured page. Without a page URL the card never becomes valid.
pub fn card(options: PictureOptions) -> Card {
    if options.page_url.is_empty() {
        return Card::new(CardKind::Text, 35);
    }

    let fetcher = Fetcher::new(async move { fetch_picture(&options).await });
    Card::new(CardKind::Text, 35).with_loader(async move {
        let picture = fetcher.get().await?;
        Ok(CardContent::Text {
            title: Some(picture.label),
            body: format!(r#"<img src="{}">"#, picture.url),
        })
    })
}

const FAKE_PICTURE: &str = "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' \
     width='320' height='240'%3E%3Crect width='320' height='240' fill='%23b5c9a4'/%3E\
     %3Ccircle cx='160' cy='120' r='60' fill='%236b8f5a'/%3E%3C/svg%3E";

/// Creates a picture Card that needs no network access.
pub fn fake_card() -> Card {
    Card::new(CardKind::Text, 35).with_loader(async {
        let labels = ["Panda roux", "Axolotl", "Tortue d'Hermann", "Harfang des neiges"];
        let label = labels
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(labels[0]);
        Ok(CardContent::Text {
            title: Some(label.to_string()),
            body: format!(r#"<img src="{FAKE_PICTURE}">"#),
        })
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Picture {
    label: String,
    url: String,
}

async fn fetch_picture(options: &PictureOptions) -> Result<Picture> {
    let body = http_client()?
        .get(&options.page_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let candidates = scrape_pictures(&body, options)?;
    candidates
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| Error::Other("no pictures found on the page".into()))
}

fn scrape_pictures(html: &str, options: &PictureOptions) -> Result<Vec<Picture>> {
    let images = Selector::parse(&options.image_selector)
        .map_err(|e| Error::ConfigError(format!("invalid image selector: {e:?}")))?;
    let labels = Selector::parse(&options.label_selector)
        .map_err(|e| Error::ConfigError(format!("invalid label selector: {e:?}")))?;
    let page = Url::parse(&options.page_url)
        .map_err(|e| Error::DecodeError(format!("invalid page URL: {e}")))?;

    let document = Html::parse_document(html);
    let mut pictures = Vec::new();

    for image in document.select(&images) {
        let label = image.select(&labels).next().or_else(|| {
            image
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|parent| parent.select(&labels).next())
        });
        let Some(label) = label else { continue };
        let Some(src) = image.value().attr("src") else { continue };

        let url = page
            .join(src)
            .map_err(|e| Error::DecodeError(format!("invalid picture URL: {e}")))?;
        pictures.push(Picture {
            label: label.text().collect::<String>().trim().to_string(),
            url: url.to_string(),
        });
    }

    Ok(pictures)
}
