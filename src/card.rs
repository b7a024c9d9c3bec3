//! Display cards, the unit of content on the screen.
//!
//! A card is constructed cheaply with its priority and static fields, and
//! carries an optional deferred loader that produces its dynamic content.
//! Nothing runs until [`Card::load`] is awaited, so building the full card
//! set never touches the network.

use std::fmt;

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

use crate::chart::Chart;
use crate::error::Result;

/// What kind of content a card displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    /// Title, body and footer.
    Text,
    /// Title, list items and footer.
    List,
    /// Title, chart and footer.
    Chart,
}

/// Content produced by a card loader, applied to the card on success.
#[derive(Debug, Clone, PartialEq)]
pub enum CardContent {
    Text {
        /// Replaces the card title when present.
        title: Option<String>,
        body: String,
    },
    List(Vec<String>),
    Chart(Chart),
}

/// A single information card to be displayed on the screen.
///
/// `title`, `footer` and `body` hold markup that is passed through to the
/// renderer verbatim.
pub struct Card {
    pub title: String,
    pub footer: String,
    pub kind: CardKind,

    /// For [`CardKind::Text`]
    pub body: String,

    /// For [`CardKind::List`]
    pub items: Vec<String>,

    /// For [`CardKind::Chart`]
    pub chart: Chart,

    /// Higher priority cards are displayed first.
    pub priority: i32,

    loader: Option<BoxFuture<'static, Result<CardContent>>>,
}

impl Card {
    /// Creates an empty card. Until content is set (directly or through a
    /// loader) the card is not valid.
    pub fn new(kind: CardKind, priority: i32) -> Self {
        Self {
            title: String::new(),
            footer: String::new(),
            kind,
            body: String::new(),
            items: Vec::new(),
            chart: Chart::default(),
            priority,
            loader: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Attaches the deferred operation that produces this card's content.
    /// The future is not polled until [`load`](Self::load).
    pub fn with_loader<F>(mut self, loader: F) -> Self
    where
        F: Future<Output = Result<CardContent>> + Send + 'static,
    {
        self.loader = Some(loader.boxed());
        self
    }

    /// Populates the card's dynamic content by running its loader, if any.
    /// A failed load leaves the dynamic fields untouched, so the card
    /// simply stays invalid and is filtered out later.
    pub async fn load(&mut self) -> Result<()> {
        if let Some(loader) = self.loader.take() {
            let content = loader.await?;
            self.apply(content);
        }
        Ok(())
    }

    fn apply(&mut self, content: CardContent) {
        match content {
            CardContent::Text { title, body } => {
                if let Some(title) = title {
                    self.title = title;
                }
                self.body = body;
                self.kind = CardKind::Text;
            }
            CardContent::List(items) => {
                self.items = items;
                self.kind = CardKind::List;
            }
            CardContent::Chart(chart) => {
                self.chart = chart;
                self.kind = CardKind::Chart;
            }
        }
    }

    /// Returns whether the card holds content worth displaying.
    pub fn valid(&self) -> bool {
        match self.kind {
            CardKind::Text => !self.body.is_empty(),
            CardKind::List => !self.items.is_empty(),
            CardKind::Chart => self.chart.valid(),
        }
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("title", &self.title)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("pending", &self.loader.is_some())
            .finish_non_exhaustive()
    }
}
