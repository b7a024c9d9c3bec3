//! Builds the full card set from the configuration and loads everything
//! concurrently into the data the renderer consumes.

use crate::card::{Card, CardKind};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::header::{self, Header};
use crate::{airquality, calendar, generated, picture, weather};

/// A loaded screen: the header plus the valid cards in display order.
pub struct ScreenData {
    pub header: Header,
    pub cards: Vec<Card>,
}

/// Creates the header and the full card set from the configuration.
/// With `fake` set, every data source is replaced by its synthetic
/// counterpart and a few filler cards are appended.
///
/// Nothing is fetched here; the cards carry deferred loaders that
/// [`assemble`] runs.
pub fn build_cards(config: &Config, fake: bool) -> Result<(Header, Vec<Card>)> {
    let mut cards = Vec::new();

    let air_quality = config.air_quality_options();
    cards.push(if fake {
        airquality::fake_card(&air_quality)
    } else {
        airquality::card(&air_quality)
    });

    if fake {
        cards.extend(calendar::fake_cards());
    } else {
        cards.extend(calendar::cards(config.calendar_options()?));
    }

    if fake {
        cards.extend(generated::fake_cards());
    } else {
        let generated = config.generated_options();
        if !generated.cards.is_empty() {
            cards.extend(generated::cards(&generated));
        }
    }

    let weather_options = config.weather_options();
    let (weather_cards, info) = if fake {
        weather::fake_cards_and_info(&weather_options)
    } else {
        weather::cards_and_info(&weather_options)
    };
    cards.extend(weather_cards);

    cards.push(if fake {
        picture::fake_card()
    } else {
        picture::card(config.picture_options())
    });

    if fake {
        // A few filler cards so the grid looks busy.
        cards.extend([
            Card::new(CardKind::Text, 1)
                .with_title("Disco!")
                .with_body("J'ai mal au coeur"),
            Card::new(CardKind::Text, 1)
                .with_title("J'appele docteur")
                .with_body("Il est venu"),
            Card::new(CardKind::Text, 1)
                .with_title("Il est parti")
                .with_body("En Australie"),
        ]);
    }

    let header = if fake {
        header::fake(info)
    } else {
        header::new(info)
    };

    Ok((header, cards))
}

/// Loads the header and every card in parallel, most involve network
/// calls. Keeps the cards that end up valid and sorts them, highest
/// priority first; cards of equal priority keep their construction
/// order.
///
/// Load failures never abort the screen: each one is recorded against
/// the unit that failed and the combined error is returned alongside
/// whatever did load.
pub async fn assemble(header: Header, cards: Vec<Card>) -> (ScreenData, Option<Error>) {
    let mut errors = Vec::new();

    let header_task = tokio::spawn(async move {
        let mut header = header;
        let result = header.load().await;
        (header, result)
    });

    let card_tasks: Vec<_> = cards
        .into_iter()
        .map(|card| {
            let unit = format!("card ({})", card.title);
            let task = tokio::spawn(async move {
                let mut card = card;
                let result = card.load().await;
                (card, result)
            });
            (unit, task)
        })
        .collect();

    let header = match header_task.await {
        Ok((header, result)) => {
            if let Err(e) = result {
                errors.push(Error::load("header", e));
            }
            header
        }
        Err(e) => {
            errors.push(Error::load("header", Error::Other(e.to_string())));
            Header::default()
        }
    };

    let mut loaded = Vec::new();
    for (unit, task) in card_tasks {
        match task.await {
            Ok((card, result)) => {
                if let Err(e) = result {
                    errors.push(Error::load(unit, e));
                }
                // A failed card keeps whatever static content it had; the
                // validity filter below decides whether it is shown.
                loaded.push(card);
            }
            Err(e) => errors.push(Error::load(unit, Error::Other(e.to_string()))),
        }
    }

    let mut cards: Vec<Card> = loaded.into_iter().filter(Card::valid).collect();
    cards.sort_by(|a, b| b.priority.cmp(&a.priority));

    (ScreenData { header, cards }, Error::join(errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardContent;
    use crate::weather::testing;

    #[tokio::test]
    async fn failing_loaders_yield_an_empty_screen_and_an_error() {
        let cards = vec![
            Card::new(CardKind::Text, 10)
                .with_title("A")
                .with_loader(async { Err(Error::NetworkError("a down".into())) }),
            Card::new(CardKind::Chart, 20)
                .with_title("B")
                .with_loader(async { Err(Error::NetworkError("b down".into())) }),
        ];
        let header = header::new(testing::failing_info(Error::NetworkError("w down".into())));

        let (data, error) = assemble(header, cards).await;

        assert!(data.cards.is_empty());
        let message = error.unwrap().to_string();
        assert!(message.contains("Failed to load header"));
        assert!(message.contains("card (A)"));
        assert!(message.contains("card (B)"));
    }

    #[tokio::test]
    async fn assemble_keeps_valid_cards_in_priority_order() {
        let cards = vec![
            Card::new(CardKind::Text, 50)
                .with_title("first fifty")
                .with_loader(async {
                    Ok(CardContent::Text {
                        title: None,
                        body: "un".into(),
                    })
                }),
            Card::new(CardKind::Text, 10)
                .with_title("broken")
                .with_loader(async { Err(Error::NetworkError("down".into())) }),
            Card::new(CardKind::Text, 90).with_title("ninety").with_body("deux"),
            Card::new(CardKind::Text, 50)
                .with_title("second fifty")
                .with_body("trois"),
            Card::new(CardKind::List, 70).with_title("empty list"),
        ];
        let header = header::new(testing::info("clear-sky", 5, 0));

        let (data, error) = assemble(header, cards).await;

        let titles: Vec<_> = data.cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["ninety", "first fifty", "second fifty"]);
        assert!(error.is_some());
        assert_eq!(data.header.condition_icon, "sunny");
    }

    #[tokio::test]
    async fn failed_cards_with_static_content_are_kept() {
        let cards = vec![Card::new(CardKind::Text, 10)
            .with_title("stale")
            .with_body("hier")
            .with_loader(async { Err(Error::NetworkError("down".into())) })];
        let header = header::new(testing::info("fog", 0, 0));

        let (data, error) = assemble(header, cards).await;

        assert_eq!(data.cards.len(), 1);
        assert_eq!(data.cards[0].body, "hier");
        assert!(error.is_some());
    }

    #[tokio::test]
    async fn fake_screen_assembles_in_priority_order() {
        let (header, cards) = build_cards(&Config::default(), true).unwrap();
        let (data, error) = assemble(header, cards).await;

        assert!(error.is_none());
        assert!(!data.header.title.is_empty());

        let priorities: Vec<_> = data.cards.iter().map(|c| c.priority).collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]));

        // The random fake charts and calendars may come up empty, these
        // cards are always valid.
        let titles: Vec<_> = data.cards.iter().map(|c| c.title.as_str()).collect();
        assert!(titles.contains(&"Dans l'histoire"));
        assert!(titles.contains(&"Blague du jour"));
        assert!(titles.contains(&"Disco!"));
    }
}
