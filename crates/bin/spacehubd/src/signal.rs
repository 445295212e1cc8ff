//! Presence signals: one textual command per line, turned into occupancy
//! transitions on the entity model collection.
//!
//! ```text
//! enter person.alice space.kitchen
//! exit person.alice space.kitchen
//! marker ble:c4:7c:8d:6a:12:34 enter space.kitchen
//! occupants space.kitchen
//! # comments and blank lines are ignored
//! ```

use std::fmt;
use std::str::FromStr;

use spacehub_app::model::collection::EntityModelCollection;
use spacehub_app::model::updater::ModelUpdater;
use spacehub_domain::error::{SpaceHubError, ValidationError};
use spacehub_domain::id::EntityId;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Enter,
    Exit,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
        }
    }
}

impl FromStr for Direction {
    type Err = SignalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter" => Ok(Self::Enter),
            "exit" => Ok(Self::Exit),
            other => Err(SignalParseError::UnknownDirection(other.to_string())),
        }
    }
}

/// A parsed presence signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A person was sensed in (or lost from) a space.
    Presence {
        direction: Direction,
        person: EntityId,
        space: EntityId,
    },
    /// A hardware marker was sensed in (or lost from) a space.
    Marker {
        marker_id: String,
        direction: Direction,
        space: EntityId,
    },
    /// Report who is in a space.
    Occupants { space: EntityId },
}

impl Signal {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`SignalParseError`] when the line is not a known command
    /// with the right number of arguments.
    pub fn parse(line: &str) -> Result<Option<Self>, SignalParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let signal = match command {
            "enter" | "exit" => Self::Presence {
                direction: command.parse()?,
                person: argument(&mut words, command, "person")?.parse()?,
                space: argument(&mut words, command, "space")?.parse()?,
            },
            "marker" => Self::Marker {
                marker_id: argument(&mut words, command, "marker id")?.to_string(),
                direction: argument(&mut words, command, "direction")?.parse()?,
                space: argument(&mut words, command, "space")?.parse()?,
            },
            "occupants" => Self::Occupants {
                space: argument(&mut words, command, "space")?.parse()?,
            },
            other => return Err(SignalParseError::UnknownCommand(other.to_string())),
        };
        if let Some(extra) = words.next() {
            return Err(SignalParseError::TrailingArgument(extra.to_string()));
        }
        Ok(Some(signal))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence {
                direction,
                person,
                space,
            } => write!(f, "{} {person} {space}", direction.as_str()),
            Self::Marker {
                marker_id,
                direction,
                space,
            } => write!(f, "marker {marker_id} {} {space}", direction.as_str()),
            Self::Occupants { space } => write!(f, "occupants {space}"),
        }
    }
}

fn argument<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &str,
    name: &'static str,
) -> Result<&'a str, SignalParseError> {
    words.next().ok_or_else(|| SignalParseError::MissingArgument {
        command: command.to_string(),
        argument: name,
    })
}

/// Signal parse errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalParseError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },
    #[error("unexpected argument {0:?}")]
    TrailingArgument(String),
    #[error("unknown direction {0:?}, expected enter or exit")]
    UnknownDirection(String),
    #[error(transparent)]
    InvalidId(#[from] ValidationError),
}

/// What applying a signal produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// A transition was applied; `true` when membership changed.
    Transition(bool),
    /// Ids of the people in the space, in id order.
    Occupants(Vec<EntityId>),
}

/// Apply `signal` to the models of `collection`.
///
/// # Errors
///
/// Returns [`SpaceHubError::NotFound`] when the signal names an entity or
/// marker the collection does not know.
pub fn apply(
    collection: &EntityModelCollection,
    signal: &Signal,
) -> Result<SignalOutcome, SpaceHubError> {
    let (updater, direction) = match signal {
        Signal::Presence {
            direction,
            person,
            space,
        } => (collection.updater(space, person)?, *direction),
        Signal::Marker {
            marker_id,
            direction,
            space,
        } => {
            let person = collection.person_by_marker(marker_id)?;
            let updater = ModelUpdater::new(collection.physical_space(space)?, person)?;
            (updater, *direction)
        }
        Signal::Occupants { space } => {
            let occupants = collection
                .physical_space(space)?
                .occupants()
                .iter()
                .map(|person| person.id().clone())
                .collect();
            return Ok(SignalOutcome::Occupants(occupants));
        }
    };
    let changed = match direction {
        Direction::Enter => updater.enter_space()?,
        Direction::Exit => updater.exit_space()?,
    };
    Ok(SignalOutcome::Transition(changed))
}

/// Line counters of one [`run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SignalStats {
    pub applied: usize,
    pub rejected: usize,
}

/// Read signals from `reader` until EOF and apply each in turn.
///
/// Malformed lines and signals naming unknown entities are logged and
/// skipped.
///
/// # Errors
///
/// Returns an error only when reading from `reader` fails.
pub async fn run<R>(reader: R, collection: &EntityModelCollection) -> std::io::Result<SignalStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = SignalStats::default();
    while let Some(line) = lines.next_line().await? {
        let signal = match Signal::parse(&line) {
            Ok(Some(signal)) => signal,
            Ok(None) => continue,
            Err(error) => {
                stats.rejected += 1;
                tracing::warn!(line = line.trim(), %error, "malformed signal");
                continue;
            }
        };
        match apply(collection, &signal) {
            Ok(SignalOutcome::Transition(changed)) => {
                stats.applied += 1;
                tracing::debug!(%signal, changed, "signal applied");
            }
            Ok(SignalOutcome::Occupants(occupants)) => {
                stats.applied += 1;
                let occupants: Vec<&str> = occupants.iter().map(EntityId::as_str).collect();
                tracing::info!(%signal, occupants = ?occupants, "occupants");
            }
            Err(error) => {
                stats.rejected += 1;
                tracing::warn!(%signal, %error, "signal rejected");
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacehub_domain::description::EntityDescription;
    use tokio::io::BufReader;

    fn id(value: &str) -> EntityId {
        EntityId::new(value).unwrap()
    }

    fn collection() -> EntityModelCollection {
        EntityModelCollection::new(vec![
            EntityDescription::physical_space()
                .id("space.kitchen")
                .display_name("Kitchen")
                .build()
                .unwrap(),
            EntityDescription::person()
                .id("person.alice")
                .display_name("Alice")
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn should_parse_presence_signal() {
        let signal = Signal::parse("  enter person.alice   space.kitchen ").unwrap();

        assert_eq!(
            signal,
            Some(Signal::Presence {
                direction: Direction::Enter,
                person: id("person.alice"),
                space: id("space.kitchen"),
            })
        );
    }

    #[test]
    fn should_parse_marker_signal() {
        let signal = Signal::parse("marker ble:aa:bb exit space.kitchen").unwrap();

        assert_eq!(
            signal,
            Some(Signal::Marker {
                marker_id: "ble:aa:bb".to_string(),
                direction: Direction::Exit,
                space: id("space.kitchen"),
            })
        );
    }

    #[test]
    fn should_ignore_blank_and_comment_lines() {
        assert_eq!(Signal::parse("").unwrap(), None);
        assert_eq!(Signal::parse("   ").unwrap(), None);
        assert_eq!(Signal::parse("# enter person.alice space.kitchen").unwrap(), None);
    }

    #[test]
    fn should_reject_malformed_lines() {
        assert_eq!(
            Signal::parse("teleport person.alice"),
            Err(SignalParseError::UnknownCommand("teleport".to_string()))
        );
        assert_eq!(
            Signal::parse("enter person.alice"),
            Err(SignalParseError::MissingArgument {
                command: "enter".to_string(),
                argument: "space",
            })
        );
        assert_eq!(
            Signal::parse("occupants space.kitchen now"),
            Err(SignalParseError::TrailingArgument("now".to_string()))
        );
        assert_eq!(
            Signal::parse("marker ble:aa:bb wander space.kitchen"),
            Err(SignalParseError::UnknownDirection("wander".to_string()))
        );
    }

    #[test]
    fn should_display_signal_as_its_input_form() {
        let line = "marker ble:aa:bb enter space.kitchen";
        let signal = Signal::parse(line).unwrap().unwrap();
        assert_eq!(signal.to_string(), line);
    }

    #[test]
    fn should_apply_enter_then_list_occupants() {
        let collection = collection();

        let entered = apply(
            &collection,
            &Signal::parse("enter person.alice space.kitchen").unwrap().unwrap(),
        )
        .unwrap();
        let occupants = apply(
            &collection,
            &Signal::parse("occupants space.kitchen").unwrap().unwrap(),
        )
        .unwrap();

        assert_eq!(entered, SignalOutcome::Transition(true));
        assert_eq!(occupants, SignalOutcome::Occupants(vec![id("person.alice")]));
    }

    #[test]
    fn should_return_not_found_when_signal_names_unknown_space() {
        let collection = collection();

        let result = apply(
            &collection,
            &Signal::parse("enter person.alice space.attic").unwrap().unwrap(),
        );

        assert!(matches!(result, Err(SpaceHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_skip_bad_lines_and_keep_reading() {
        let collection = collection();
        let input = "\
            enter person.alice space.kitchen\n\
            # alice is still here\n\
            enter person.alice space.kitchen\n\
            dance person.alice\n\
            enter person.bob space.kitchen\n\
            exit person.alice space.kitchen\n";

        let stats = run(BufReader::new(input.as_bytes()), &collection)
            .await
            .unwrap();

        assert_eq!(
            stats,
            SignalStats {
                applied: 3,
                rejected: 2,
            }
        );
        let kitchen = collection.physical_space(&id("space.kitchen")).unwrap();
        assert_eq!(kitchen.occupant_count(), 0);
    }
}
