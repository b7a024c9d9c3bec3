//! Calendar cards listing today's and tomorrow's events.
//!
//! Every configured ICS feed is fetched once per screen; both cards share
//! the result through one [`Fetcher`]. Events can be narrowed down to the
//! ones a given person attends with a per-calendar regular expression.

use std::fmt;
use std::io::BufReader;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use ical::IcalParser;
use rand::Rng;
use regex::Regex;

use crate::card::{Card, CardContent, CardKind};
use crate::error::{Error, Result};
use crate::fetch::{http_client, Fetcher};

/// Options for one calendar feed.
/// `attendees` can be `None` to disable filtering.
#[derive(Debug, Clone)]
pub struct CalendarOptions {
    pub url: String,
    pub attendees: Option<Regex>,
}

impl CalendarOptions {
    /// Whether the event matches the attendees filter. Events match when
    /// any attendee's display name or address matches, or when no filter
    /// is set.
    fn matches(&self, event: &IcalEvent) -> bool {
        let Some(filter) = &self.attendees else {
            return true;
        };
        event
            .properties
            .iter()
            .filter(|p| p.name == "ATTENDEE")
            .any(|p| {
                let name = p.params.as_deref().and_then(|params| {
                    params
                        .iter()
                        .find(|(key, _)| key == "CN")
                        .and_then(|(_, values)| values.first())
                });
                name.map_or(false, |n| filter.is_match(n))
                    || p.value.as_deref().map_or(false, |v| filter.is_match(v))
            })
    }
}

/// An event to display, with no time for all-day events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub summary: String,
    pub time: Option<DateTime<Local>>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(time) => write!(f, "{}{}", time.format("%Hh%M "), self.summary),
            None => f.write_str(&self.summary),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CalendarData {
    today: Vec<Event>,
    tomorrow: Vec<Event>,
}

impl CalendarData {
    /// All-day events have no time and therefore sort first.
    fn sort(&mut self) {
        self.today.sort_by_key(|e| e.time);
        self.tomorrow.sort_by_key(|e| e.time);
    }
}

/// Creates the "Aujourd'hui" and "Demain" Cards over the given feeds.
pub fn cards(options: Vec<CalendarOptions>) -> Vec<Card> {
    make_cards(Fetcher::new(async move { fetch_calendars(&options).await }))
}

/// Creates calendar Cards with fake events randomly spread over the two days.
pub fn fake_cards() -> Vec<Card> {
    make_cards(Fetcher::new(async { fake_calendar_data() }))
}

fn make_cards(calendar: Fetcher<CalendarData>) -> Vec<Card> {
    let today = {
        let calendar = calendar.clone();
        Card::new(CardKind::List, 100)
            .with_title("Aujourd'hui")
            .with_loader(async move {
                let calendar = calendar.get().await?;
                Ok(CardContent::List(
                    calendar.today.iter().map(|e| e.to_string()).collect(),
                ))
            })
    };

    let tomorrow = Card::new(CardKind::List, 50)
        .with_title("Demain")
        .with_loader(async move {
            let calendar = calendar.get().await?;
            Ok(CardContent::List(
                calendar.tomorrow.iter().map(|e| e.to_string()).collect(),
            ))
        });

    vec![today, tomorrow]
}

async fn fetch_calendars(options: &[CalendarOptions]) -> Result<CalendarData> {
    let mut calendar = CalendarData::default();
    let client = http_client()?;

    for option in options {
        let body = client
            .get(&option.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        collect_events(&body, option, Local::now(), &mut calendar)?;
    }

    calendar.sort();
    Ok(calendar)
}

/// Parses an ICS document and appends the events of today and tomorrow,
/// relative to `now`, into `calendar`.
fn collect_events(
    ics: &str,
    options: &CalendarOptions,
    now: DateTime<Local>,
    calendar: &mut CalendarData,
) -> Result<()> {
    let today = local_midnight(now)?;
    let tomorrow = today + Duration::days(1);

    // Let all-day events start one second before today so they are kept.
    let start = today - Duration::seconds(1);
    let end = tomorrow + Duration::days(1);

    for parsed in IcalParser::new(BufReader::new(ics.as_bytes())) {
        let parsed =
            parsed.map_err(|e| Error::DecodeError(format!("invalid calendar: {e}")))?;

        for event in &parsed.events {
            let Some(event_start) = event_start(event) else {
                continue;
            };
            if event_start < start || event_start >= end {
                continue;
            }
            // Ignore all-day events from the previous day.
            if event_start < today {
                continue;
            }

            if !options.matches(event) {
                tracing::debug!(
                    summary = summary(event),
                    "skipping event, no attendee matches the filter"
                );
                continue;
            }

            // Don't include a time for all-day events.
            let time = if event_start.hour() > 0 || event_start.minute() > 0 {
                Some(event_start)
            } else {
                None
            };

            let entry = Event {
                summary: summary(event).to_string(),
                time,
            };
            if event_start < tomorrow {
                calendar.today.push(entry);
            } else {
                calendar.tomorrow.push(entry);
            }
        }
    }

    Ok(())
}

fn fake_calendar_data() -> Result<CalendarData> {
    let mut rng = rand::thread_rng();
    let midnight = local_midnight(Local::now())?;

    let mut calendar = CalendarData::default();
    for (summary, minutes) in [
        ("Estelle: Arts plastiques", None),
        ("Julie: Musique", None),
        ("Parc avec les amis", Some(10 * 60 + 30)),
        ("Dîner au restaurant", Some(12 * 60)),
        ("Souper chez mamie", Some(18 * 60)),
        ("Film en famille", Some(19 * 60)),
    ] {
        let event = Event {
            summary: summary.to_string(),
            time: minutes.map(|m| midnight + Duration::minutes(m)),
        };
        let x: f32 = rng.gen();
        if x > 0.75 {
            calendar.today.push(event);
        } else if x > 0.5 {
            calendar.tomorrow.push(event);
        }
    }

    calendar.sort();
    Ok(calendar)
}

fn local_midnight(now: DateTime<Local>) -> Result<DateTime<Local>> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .ok_or_else(|| Error::Other("cannot resolve local midnight".into()))
}

fn property<'a>(event: &'a IcalEvent, name: &str) -> Option<&'a Property> {
    event.properties.iter().find(|p| p.name == name)
}

fn summary(event: &IcalEvent) -> &str {
    property(event, "SUMMARY")
        .and_then(|p| p.value.as_deref())
        .unwrap_or_default()
}

fn event_start(event: &IcalEvent) -> Option<DateTime<Local>> {
    let prop = property(event, "DTSTART")?;
    let value = prop.value.as_deref()?;
    let params = prop.params.as_deref();
    let is_date = params.map_or(false, |params| {
        params
            .iter()
            .any(|(key, values)| key == "VALUE" && values.iter().any(|v| v == "DATE"))
    });
    let tzid = params.and_then(|params| {
        params
            .iter()
            .find(|(key, _)| key == "TZID")
            .and_then(|(_, values)| values.first())
    });
    parse_ics_time(value, is_date, tzid.map(String::as_str))
}

/// Parses the DTSTART formats seen in the wild: all-day dates, UTC
/// timestamps with a `Z` suffix, TZID-qualified times resolved in the
/// named zone, and floating times taken as local time.
fn parse_ics_time(value: &str, is_date: bool, tzid: Option<&str>) -> Option<DateTime<Local>> {
    if is_date || value.len() == 8 {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
        return date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(Local).earliest());
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(Utc.from_utc_datetime(&naive).with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;

    if let Some(tzid) = tzid {
        match tzid.parse::<Tz>() {
            Ok(zone) => {
                return zone
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|time| time.with_timezone(&Local));
            }
            Err(_) => {
                tracing::debug!(tzid, "unknown calendar timezone, reading the time as local");
            }
        }
    }

    naive.and_local_timezone(Local).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::RegexBuilder;

    struct TestEvent {
        summary: &'static str,
        dtstart: String,
        attendees: Vec<(&'static str, &'static str)>,
    }

    fn ics(events: &[TestEvent]) -> String {
        let mut out = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
        for event in events {
            out.push_str("BEGIN:VEVENT\r\n");
            out.push_str(&format!("SUMMARY:{}\r\n", event.summary));
            out.push_str(&format!("{}\r\n", event.dtstart));
            for (name, address) in &event.attendees {
                out.push_str(&format!("ATTENDEE;CN={name}:mailto:{address}\r\n"));
            }
            out.push_str("END:VEVENT\r\n");
        }
        out.push_str("END:VCALENDAR\r\n");
        out
    }

    fn timed(day: DateTime<Local>, hour: u32, minute: u32) -> String {
        let start = day + Duration::hours(i64::from(hour)) + Duration::minutes(i64::from(minute));
        format!("DTSTART:{}", start.format("%Y%m%dT%H%M%S"))
    }

    fn all_day(day: DateTime<Local>) -> String {
        format!("DTSTART;VALUE=DATE:{}", day.format("%Y%m%d"))
    }

    fn no_filter() -> CalendarOptions {
        CalendarOptions {
            url: String::new(),
            attendees: None,
        }
    }

    fn filter(pattern: &str) -> CalendarOptions {
        CalendarOptions {
            url: String::new(),
            attendees: Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .unwrap(),
            ),
        }
    }

    fn collect(ics: &str, options: &CalendarOptions) -> CalendarData {
        let mut calendar = CalendarData::default();
        collect_events(ics, options, Local::now(), &mut calendar).unwrap();
        calendar.sort();
        calendar
    }

    #[test]
    fn buckets_events_into_today_and_tomorrow() {
        let now = Local::now();
        let today = local_midnight(now).unwrap();
        let tomorrow = today + Duration::days(1);

        let doc = ics(&[
            TestEvent {
                summary: "Dîner au restaurant",
                dtstart: timed(today, 12, 0),
                attendees: vec![],
            },
            TestEvent {
                summary: "Parc avec les amis",
                dtstart: timed(tomorrow, 10, 30),
                attendees: vec![],
            },
            TestEvent {
                summary: "Hier",
                dtstart: timed(today - Duration::days(1), 9, 0),
                attendees: vec![],
            },
            TestEvent {
                summary: "Trop loin",
                dtstart: timed(tomorrow + Duration::days(1), 9, 0),
                attendees: vec![],
            },
        ]);

        let calendar = collect(&doc, &no_filter());
        assert_eq!(calendar.today.len(), 1);
        assert_eq!(calendar.today[0].to_string(), "12h00 Dîner au restaurant");
        assert_eq!(calendar.tomorrow.len(), 1);
        assert_eq!(calendar.tomorrow[0].to_string(), "10h30 Parc avec les amis");
    }

    #[test]
    fn all_day_events_carry_no_time_and_sort_first() {
        let now = Local::now();
        let today = local_midnight(now).unwrap();

        let doc = ics(&[
            TestEvent {
                summary: "Dîner au restaurant",
                dtstart: timed(today, 12, 0),
                attendees: vec![],
            },
            TestEvent {
                summary: "Julie: Musique",
                dtstart: all_day(today),
                attendees: vec![],
            },
        ]);

        let calendar = collect(&doc, &no_filter());
        assert_eq!(calendar.today.len(), 2);
        assert_eq!(calendar.today[0].to_string(), "Julie: Musique");
        assert_eq!(calendar.today[0].time, None);
        assert_eq!(calendar.today[1].to_string(), "12h00 Dîner au restaurant");
    }

    #[test]
    fn all_day_events_from_yesterday_are_skipped() {
        let now = Local::now();
        let today = local_midnight(now).unwrap();
        let doc = ics(&[TestEvent {
            summary: "Hier toute la journée",
            dtstart: all_day(today - Duration::days(1)),
            attendees: vec![],
        }]);

        let calendar = collect(&doc, &no_filter());
        assert!(calendar.today.is_empty());
        assert!(calendar.tomorrow.is_empty());
    }

    #[test]
    fn events_sort_by_start_time() {
        let now = Local::now();
        let today = local_midnight(now).unwrap();
        let doc = ics(&[
            TestEvent {
                summary: "Souper chez mamie",
                dtstart: timed(today, 18, 0),
                attendees: vec![],
            },
            TestEvent {
                summary: "Parc avec les amis",
                dtstart: timed(today, 10, 30),
                attendees: vec![],
            },
            TestEvent {
                summary: "Matin",
                dtstart: timed(today, 9, 5),
                attendees: vec![],
            },
        ]);

        let calendar = collect(&doc, &no_filter());
        let order: Vec<String> = calendar.today.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            order,
            vec![
                "09h05 Matin",
                "10h30 Parc avec les amis",
                "18h00 Souper chez mamie"
            ]
        );
    }

    #[test]
    fn attendee_filter_matches_name_case_insensitively() {
        let now = Local::now();
        let today = local_midnight(now).unwrap();
        let doc = ics(&[
            TestEvent {
                summary: "Rendez-vous",
                dtstart: timed(today, 14, 0),
                attendees: vec![("Alice Smith", "asmith@example.com")],
            },
            TestEvent {
                summary: "Réunion",
                dtstart: timed(today, 15, 0),
                attendees: vec![("Bob Jones", "bob@example.com")],
            },
            TestEvent {
                summary: "Sans invités",
                dtstart: timed(today, 16, 0),
                attendees: vec![],
            },
        ]);

        let calendar = collect(&doc, &filter("alice"));
        assert_eq!(calendar.today.len(), 1);
        assert_eq!(calendar.today[0].summary, "Rendez-vous");
    }

    #[test]
    fn attendee_filter_matches_the_address_too() {
        let now = Local::now();
        let today = local_midnight(now).unwrap();
        let doc = ics(&[TestEvent {
            summary: "Rendez-vous",
            dtstart: timed(today, 14, 0),
            attendees: vec![("A. S.", "alice@example.com")],
        }]);

        let calendar = collect(&doc, &filter("alice"));
        assert_eq!(calendar.today.len(), 1);
    }

    #[test]
    fn no_filter_keeps_everything() {
        let now = Local::now();
        let today = local_midnight(now).unwrap();
        let doc = ics(&[TestEvent {
            summary: "Sans invités",
            dtstart: timed(today, 16, 0),
            attendees: vec![],
        }]);

        let calendar = collect(&doc, &no_filter());
        assert_eq!(calendar.today.len(), 1);
    }

    #[test]
    fn midnight_events_are_treated_as_all_day() {
        let now = Local::now();
        let today = local_midnight(now).unwrap();
        let doc = ics(&[TestEvent {
            summary: "Minuit",
            dtstart: timed(today, 0, 0),
            attendees: vec![],
        }]);

        let calendar = collect(&doc, &no_filter());
        assert_eq!(calendar.today.len(), 1);
        assert_eq!(calendar.today[0].time, None);
    }

    #[test]
    fn tzid_times_resolve_to_the_calendar_zone() {
        // New York is four hours behind UTC in August and five in January.
        let cases = [
            ("20260822T093000", "20260822T133000Z"),
            ("20260115T093000", "20260115T143000Z"),
        ];
        for (named, utc) in cases {
            assert_eq!(
                parse_ics_time(named, false, Some("America/New_York")).unwrap(),
                parse_ics_time(utc, false, None).unwrap(),
            );
        }
    }

    #[test]
    fn tzid_params_are_read_from_the_event() {
        let doc = ics(&[TestEvent {
            summary: "Rendez-vous",
            dtstart: "DTSTART;TZID=America/New_York:20260822T093000".into(),
            attendees: vec![],
        }]);
        let parsed = IcalParser::new(BufReader::new(doc.as_bytes()))
            .next()
            .expect("one calendar")
            .expect("valid calendar");

        let start = event_start(&parsed.events[0]).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 22, 13, 30, 0).unwrap());
    }

    #[test]
    fn unknown_tzid_falls_back_to_local_time() {
        assert_eq!(
            parse_ics_time("20260822T093000", false, Some("Neverland/Nowhere")).unwrap(),
            parse_ics_time("20260822T093000", false, None).unwrap(),
        );
    }

    #[tokio::test]
    async fn cards_list_the_events() {
        let data = CalendarData {
            today: vec![Event {
                summary: "Dîner au restaurant".into(),
                time: None,
            }],
            tomorrow: vec![],
        };
        let mut cards = make_cards(Fetcher::new(async move { Ok(data) }));
        let mut tomorrow = cards.pop().expect("two cards");
        let mut today = cards.pop().expect("two cards");

        assert_eq!(today.title, "Aujourd'hui");
        assert_eq!(today.priority, 100);
        today.load().await.unwrap();
        assert_eq!(today.items, vec!["Dîner au restaurant"]);
        assert!(today.valid());

        assert_eq!(tomorrow.title, "Demain");
        assert_eq!(tomorrow.priority, 50);
        tomorrow.load().await.unwrap();
        assert!(!tomorrow.valid());
    }

    #[test]
    fn fake_events_land_in_either_bucket() {
        let calendar = fake_calendar_data().unwrap();
        assert!(calendar.today.len() + calendar.tomorrow.len() <= 6);
        for event in calendar.today.iter().chain(&calendar.tomorrow) {
            assert!(!event.summary.is_empty());
        }
    }
}
