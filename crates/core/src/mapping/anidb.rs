//! AniDB episode override document (`anime-list-master.xml`).
//!
//! Only `<mapping-list>` entries are indexed; the plain season/offset data
//! in the same document is already covered by the anime ids table.

use std::collections::{BTreeSet, HashMap};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, warn};

use super::types::MappingError;

/// Explicit episode table for one (AniDB id, TVDB season) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AniDbSeasonOverride {
    pub anidb_id: u32,
    pub tvdb_season: i32,
    /// (AniDB episode, TVDB episode) pairs in document order.
    pub episodes: Vec<(u32, u32)>,
}

impl AniDbSeasonOverride {
    /// TVDB episode numbers covered by this override.
    pub fn tvdb_episodes(&self) -> BTreeSet<u32> {
        self.episodes.iter().map(|(_, tvdb)| *tvdb).collect()
    }
}

/// Overrides indexed by (AniDB id, TVDB season).
///
/// Each `<anime>` element contributes at most one row per season, so more
/// than one row for a key means the document lists the same anime twice.
#[derive(Debug, Clone, Default)]
pub struct AniDbOverrides {
    index: HashMap<(u32, i32), Vec<AniDbSeasonOverride>>,
}

impl AniDbOverrides {
    pub fn from_overrides(overrides: Vec<AniDbSeasonOverride>) -> Self {
        let mut index: HashMap<(u32, i32), Vec<AniDbSeasonOverride>> = HashMap::new();
        for o in overrides {
            index.entry((o.anidb_id, o.tvdb_season)).or_default().push(o);
        }
        Self { index }
    }

    /// Every override row recorded for this pair.
    pub fn rows(&self, anidb_id: u32, tvdb_season: i32) -> &[AniDbSeasonOverride] {
        self.index
            .get(&(anidb_id, tvdb_season))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Parse the XML document into the index.
    pub fn parse(xml: &str) -> Result<Self, MappingError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut overrides = Vec::new();
        let mut buf = Vec::new();

        // Season -> episode pairs for the <anime> element being read.
        let mut current_anime: Option<(u32, Vec<(i32, Vec<(u32, u32)>)>)> = None;
        // TVDB season of the open <mapping> element.
        let mut current_mapping: Option<i32> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"anime" => {
                        current_anime = attr_parse::<u32>(&e, "anidbid")?
                            .map(|id| (id, Vec::new()));
                    }
                    b"mapping" if current_anime.is_some() => {
                        current_mapping = attr_parse::<i32>(&e, "tvdbseason")?;
                    }
                    _ => {}
                },
                Ok(Event::Text(t)) => {
                    if let (Some((anidb_id, seasons)), Some(season)) =
                        (current_anime.as_mut(), current_mapping)
                    {
                        let text = t
                            .unescape()
                            .map_err(|e| MappingError::Parse(format!("anidb list: {}", e)))?;
                        let pairs = parse_episode_pairs(&text);
                        if pairs.is_empty() {
                            warn!(
                                anidb_id = *anidb_id,
                                season,
                                "Ignoring unparseable episode mapping"
                            );
                        } else if let Some((_, existing)) =
                            seasons.iter_mut().find(|(s, _)| *s == season)
                        {
                            existing.extend(pairs);
                        } else {
                            seasons.push((season, pairs));
                        }
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"mapping" => current_mapping = None,
                    b"anime" => {
                        if let Some((anidb_id, seasons)) = current_anime.take() {
                            for (tvdb_season, episodes) in seasons {
                                overrides.push(AniDbSeasonOverride {
                                    anidb_id,
                                    tvdb_season,
                                    episodes,
                                });
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(MappingError::Parse(format!(
                        "anidb list: XML error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        debug!(overrides = overrides.len(), "Loaded AniDB episode overrides");
        Ok(Self::from_overrides(overrides))
    }
}

/// Read a numeric attribute. Missing or non-numeric values yield `None`.
fn attr_parse<T: std::str::FromStr>(
    element: &BytesStart<'_>,
    name: &str,
) -> Result<Option<T>, MappingError> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| MappingError::Parse(format!("anidb list: bad attribute: {}", e)))?;

    Ok(attr.and_then(|a| {
        a.unescape_value()
            .ok()
            .and_then(|v| v.trim().parse::<T>().ok())
    }))
}

/// Parse `;1-3;2-4+5;` into (AniDB, TVDB) pairs.
///
/// `a-t+u` maps one AniDB episode onto several TVDB episodes. A TVDB
/// episode of 0 means "not present on TVDB" and is dropped.
fn parse_episode_pairs(text: &str) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();
    for chunk in text.trim().trim_matches(';').split(';') {
        let Some((anidb, tvdb)) = chunk.split_once('-') else {
            continue;
        };
        let Ok(anidb) = anidb.trim().parse::<u32>() else {
            continue;
        };
        for tvdb in tvdb.split('+') {
            if let Ok(tvdb) = tvdb.trim().parse::<u32>() {
                if tvdb > 0 {
                    pairs.push((anidb, tvdb));
                }
            }
        }
    }
    pairs
}
