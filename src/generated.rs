//! LLM-generated text cards.

use chrono::{DateTime, Local};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::json;

use crate::card::{Card, CardContent, CardKind};
use crate::error::{Error, Result};
use crate::fetch::{http_client, Fetcher};

/// Options for the generated Cards.
#[derive(Debug, Clone)]
pub struct GeneratedOptions {
    pub open_ai_api_key: String,
    pub cards: Vec<GeneratedCardOptions>,
}

/// One generated Card: a title, the prompt that produces its body, and
/// its display priority.
#[derive(Debug, Clone)]
pub struct GeneratedCardOptions {
    pub title: String,
    pub prompt: String,
    pub priority: i32,
}

/// Creates one Card per configured prompt.
pub fn cards(options: &GeneratedOptions) -> Vec<Card> {
    options
        .cards
        .iter()
        .map(|card| {
            let api_key = options.open_ai_api_key.clone();
            let prompt = card.prompt.clone();
            let fetcher =
                Fetcher::new(async move { fetch_completion(&api_key, &prompt).await });

            Card::new(CardKind::Text, card.priority)
                .with_title(card.title.clone())
                .with_loader(async move {
                    let body = fetcher.get().await?;
                    Ok(CardContent::Text { title: None, body })
                })
        })
        .collect()
}

/// Creates generated Cards with hardcoded content.
pub fn fake_cards() -> Vec<Card> {
    let blurbs = [
        "En 1900, le premier zeppelin a effectué son vol inaugural. C'était le début de \
         l'ère des dirigeables.",
        "En 1969, l'homme a marché sur la Lune pour la première fois. Un petit pas pour \
         l'homme, un grand pas pour l'humanité.",
        "En 1789, la Révolution française a commencé avec la prise de la Bastille. \
         Liberté, égalité, fraternité!",
        "En 1492, Christophe Colomb a découvert l'Amérique. Un nouveau monde s'est ouvert.",
        "En 1879, Thomas Edison a inventé l'ampoule électrique. La nuit n'a plus jamais \
         été la même.",
    ];

    vec![
        Card::new(CardKind::Text, 60)
            .with_title("Dans l'histoire")
            .with_loader(async move {
                let blurb = blurbs
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(blurbs[0]);
                Ok(CardContent::Text {
                    title: None,
                    body: blurb.to_string(),
                })
            }),
        Card::new(CardKind::Text, 50)
            .with_title("Blague du jour")
            .with_body("Pet et Répète sont dans un bateau. Pet tombe à l’eau, qui est-ce qui reste?"),
    ]
}

fn completion_request(prompt: &str, now: DateTime<Local>) -> serde_json::Value {
    json!({
        "model": "gpt-4o",
        "messages": [
            {
                "role": "system",
                "content": format!("The current date is {}", now.format("%B %-d, %Y")),
            },
            { "role": "user", "content": prompt },
        ],
    })
}

async fn fetch_completion(api_key: &str, prompt: &str) -> Result<String> {
    let request = completion_request(prompt, Local::now());

    let body = http_client()?
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .body(request.to_string())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    parse_completion(&body)
}

fn parse_completion(body: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct Response {
        choices: Vec<Choice>,
    }
    #[derive(Deserialize)]
    struct Choice {
        message: Message,
    }
    #[derive(Deserialize)]
    struct Message {
        content: String,
    }

    let response: Response = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::DecodeError("completion response held no choices".into()))
}
